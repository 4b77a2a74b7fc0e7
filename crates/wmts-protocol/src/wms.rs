//! WMS GetMap image source.

use serde::Serialize;

use wmts_common::{BoundingBox, CrsCode, ViewerError, ViewerResult};

use crate::source::{append_query, encode_value, TileLoadDecorator};

/// A single-image WMS source (one GetMap per viewport).
#[derive(Debug, Clone, Serialize)]
pub struct WmsImageSource {
    pub url: String,
    pub layers: String,
    pub format: String,
    pub version: String,
    pub crs: CrsCode,
    pub transparent: bool,
    tile_load: TileLoadDecorator,
}

impl WmsImageSource {
    pub fn new(
        url: impl Into<String>,
        layers: impl Into<String>,
        format: impl Into<String>,
        crs: CrsCode,
    ) -> Self {
        let format = format.into();
        Self {
            url: url.into(),
            layers: layers.into(),
            transparent: format == "image/png",
            format,
            version: "1.3.0".to_string(),
            crs,
            tile_load: TileLoadDecorator::default(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn tile_load(&self) -> &TileLoadDecorator {
        &self.tile_load
    }

    pub fn set_tile_load(&mut self, decorator: TileLoadDecorator) {
        self.tile_load = decorator;
    }

    /// Decorated GetMap URL for an extent and image size.
    ///
    /// WMS 1.3.0 uses the `CRS` parameter and lat/lon axis order for
    /// EPSG:4326; 1.1.x uses `SRS` and always x/y.
    pub fn image_url(&self, bbox: &BoundingBox, width: u32, height: u32) -> ViewerResult<String> {
        if width == 0 || height == 0 {
            return Err(ViewerError::InvalidParameter {
                param: "WIDTH/HEIGHT".to_string(),
                message: "image size must be non-zero".to_string(),
            });
        }

        let is_1_3 = self.version.starts_with("1.3");
        let crs_param = if is_1_3 { "CRS" } else { "SRS" };
        let lat_lon = is_1_3 && self.crs.lat_lon_axis_order();

        let query = format!(
            "SERVICE=WMS&REQUEST=GetMap&VERSION={}&LAYERS={}&STYLES=&FORMAT={}&TRANSPARENT={}&{}={}&BBOX={}&WIDTH={}&HEIGHT={}",
            self.version,
            encode_value(&self.layers),
            encode_value(&self.format),
            if self.transparent { "TRUE" } else { "FALSE" },
            crs_param,
            self.crs,
            bbox.to_wms_string(lat_lon),
            width,
            height
        );

        Ok(self.tile_load.decorate(&append_query(&self.url, &query)))
    }
}
