//! Tile sources and the URL decorator that stamps the TIME dimension.
//!
//! Every source owns its own [`TileLoadDecorator`]. When the active date
//! changes the owner builds a new decorator and installs it on each source,
//! so the next URL a source produces carries the new TIME value.

use serde::Serialize;
use url::form_urlencoded;

use wmts_common::{
    DateFilter, TileCoord, TileGrid, ViewerError, ViewerResult, XyzGrid,
};

use crate::wms::WmsImageSource;

/// Pixel ratio applied to vector tiles (MVT extent 4096 over 256px tiles).
pub const VECTOR_TILE_PIXEL_RATIO: u32 = 16;

/// Append a query string to a base URL, respecting an existing `?` or `&`.
pub fn append_query(base: &str, query: &str) -> String {
    if base.ends_with('?') || base.ends_with('&') {
        format!("{}{}", base, query)
    } else if base.contains('?') {
        format!("{}&{}", base, query)
    } else {
        format!("{}?{}", base, query)
    }
}

/// Percent-encode a KVP parameter value.
pub fn encode_value(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Fill a `{z}`/`{x}`/`{y}` URL template.
fn fill_xyz_template(template: &str, coord: &TileCoord) -> String {
    template
        .replace("{z}", &coord.z.to_string())
        .replace("{x}", &coord.x.to_string())
        .replace("{y}", &coord.y.to_string())
}

/// Rewrites a tile URL just before fetch by adding `TIME=<date|default>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TileLoadDecorator {
    time: DateFilter,
}

impl TileLoadDecorator {
    /// Build a decorator for a snapshot of the date filter.
    pub fn new(filter: &DateFilter) -> Self {
        Self {
            time: filter.clone(),
        }
    }

    pub fn decorate(&self, url: &str) -> String {
        append_query(url, &format!("TIME={}", self.time.as_param()))
    }

    pub fn time(&self) -> &DateFilter {
        &self.time
    }
}

/// Raster WMTS source using the KVP binding.
#[derive(Debug, Clone, Serialize)]
pub struct WmtsTileSource {
    pub url: String,
    pub layer: String,
    pub format: String,
    pub matrix_set: String,
    pub style: String,
    pub tile_grid: TileGrid,
    tile_load: TileLoadDecorator,
}

impl WmtsTileSource {
    pub fn new(
        url: impl Into<String>,
        layer: impl Into<String>,
        format: impl Into<String>,
        matrix_set: impl Into<String>,
        style: impl Into<String>,
        tile_grid: TileGrid,
    ) -> Self {
        Self {
            url: url.into(),
            layer: layer.into(),
            format: format.into(),
            matrix_set: matrix_set.into(),
            style: style.into(),
            tile_grid,
            tile_load: TileLoadDecorator::default(),
        }
    }

    /// GetTile URL for a tile, before decoration.
    pub fn raw_tile_url(&self, coord: &TileCoord) -> ViewerResult<String> {
        let matrix = self
            .tile_grid
            .matrix_id(coord.z)
            .ok_or_else(|| ViewerError::TileOutOfRange {
                layer: self.layer.clone(),
                zoom: coord.z,
            })?;

        let query = format!(
            "SERVICE=WMTS&REQUEST=GetTile&VERSION=1.0.0&LAYER={}&STYLE={}&FORMAT={}&TILEMATRIXSET={}&TILEMATRIX={}&TILEROW={}&TILECOL={}",
            encode_value(&self.layer),
            encode_value(&self.style),
            encode_value(&self.format),
            encode_value(&self.matrix_set),
            encode_value(matrix),
            coord.y,
            coord.x
        );
        Ok(append_query(&self.url, &query))
    }
}

/// Vector (MVT) source on an XYZ grid.
#[derive(Debug, Clone, Serialize)]
pub struct VectorTileSource {
    pub layer: String,
    pub matrix_set: String,
    pub url_template: String,
    pub grid: XyzGrid,
    pub tile_pixel_ratio: u32,
    tile_load: TileLoadDecorator,
}

impl VectorTileSource {
    pub fn new(
        endpoint: &str,
        layer: impl Into<String>,
        matrix_set: impl Into<String>,
        grid: XyzGrid,
    ) -> Self {
        let layer = layer.into();
        let matrix_set = matrix_set.into();
        let url_template = append_query(
            endpoint,
            &format!(
                "layer={}&tilematrixset={}&Service=WMTS&Request=GetTile&Version=1.0.0&Format=application%2Fx-protobuf&TileMatrix={{z}}&TileCol={{x}}&TileRow={{y}}",
                encode_value(&layer),
                encode_value(&matrix_set)
            ),
        );

        Self {
            layer,
            matrix_set,
            url_template,
            grid,
            tile_pixel_ratio: VECTOR_TILE_PIXEL_RATIO,
            tile_load: TileLoadDecorator::default(),
        }
    }

    pub fn raw_tile_url(&self, coord: &TileCoord) -> ViewerResult<String> {
        if coord.z > self.grid.max_zoom {
            return Err(ViewerError::TileOutOfRange {
                layer: self.layer.clone(),
                zoom: coord.z,
            });
        }

        Ok(fill_xyz_template(&self.url_template, coord))
    }
}

/// Raster tiles addressed by a `{z}/{x}/{y}` URL template.
#[derive(Debug, Clone, Serialize)]
pub struct XyzTileSource {
    pub url_template: String,
    pub grid: XyzGrid,
    tile_load: TileLoadDecorator,
}

impl XyzTileSource {
    pub fn new(url_template: impl Into<String>, grid: XyzGrid) -> Self {
        Self {
            url_template: url_template.into(),
            grid,
            tile_load: TileLoadDecorator::default(),
        }
    }

    pub fn raw_tile_url(&self, coord: &TileCoord) -> ViewerResult<String> {
        if coord.z > self.grid.max_zoom {
            return Err(ViewerError::TileOutOfRange {
                layer: self.url_template.clone(),
                zoom: coord.z,
            });
        }
        Ok(fill_xyz_template(&self.url_template, coord))
    }
}

/// Any source a map layer can draw from.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TileSource {
    Wmts(WmtsTileSource),
    Vector(VectorTileSource),
    Xyz(XyzTileSource),
    Wms(WmsImageSource),
}

impl TileSource {
    pub fn kind(&self) -> &'static str {
        match self {
            TileSource::Wmts(_) => "wmts",
            TileSource::Vector(_) => "vector",
            TileSource::Xyz(_) => "xyz",
            TileSource::Wms(_) => "wms",
        }
    }

    /// Server-side layer name the source requests.
    pub fn layer_name(&self) -> &str {
        match self {
            TileSource::Wmts(s) => &s.layer,
            TileSource::Vector(s) => &s.layer,
            TileSource::Xyz(s) => &s.url_template,
            TileSource::Wms(s) => &s.layers,
        }
    }

    pub fn tile_load(&self) -> &TileLoadDecorator {
        match self {
            TileSource::Wmts(s) => &s.tile_load,
            TileSource::Vector(s) => &s.tile_load,
            TileSource::Xyz(s) => &s.tile_load,
            TileSource::Wms(s) => s.tile_load(),
        }
    }

    /// Install a new fetch decorator.
    pub fn set_tile_load(&mut self, decorator: TileLoadDecorator) {
        match self {
            TileSource::Wmts(s) => s.tile_load = decorator,
            TileSource::Vector(s) => s.tile_load = decorator,
            TileSource::Xyz(s) => s.tile_load = decorator,
            TileSource::Wms(s) => s.set_tile_load(decorator),
        }
    }

    /// Decorated fetch URL for a tile.
    pub fn tile_url(&self, coord: &TileCoord) -> ViewerResult<String> {
        let raw = match self {
            TileSource::Wmts(s) => s.raw_tile_url(coord)?,
            TileSource::Vector(s) => s.raw_tile_url(coord)?,
            TileSource::Xyz(s) => s.raw_tile_url(coord)?,
            TileSource::Wms(s) => {
                return Err(ViewerError::UnsupportedOperation {
                    layer: s.layers.clone(),
                    operation: "tile_url".to_string(),
                })
            }
        };
        Ok(self.tile_load().decorate(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> TileGrid {
        TileGrid {
            origin: (-180.0, 90.0),
            resolutions: vec![0.5625, 0.28125, 0.140625],
            matrix_ids: vec!["0".to_string(), "1".to_string(), "2".to_string()],
            tile_size: 512,
        }
    }

    #[test]
    fn test_append_query() {
        assert_eq!(append_query("/wmts.cgi?", "a=1"), "/wmts.cgi?a=1");
        assert_eq!(append_query("/wmts.cgi", "a=1"), "/wmts.cgi?a=1");
        assert_eq!(append_query("/wmts.cgi?x=y", "a=1"), "/wmts.cgi?x=y&a=1");
        assert_eq!(append_query("/wmts.cgi?x=y&", "a=1"), "/wmts.cgi?x=y&a=1");
    }

    #[test]
    fn test_wmts_tile_url() {
        let source = TileSource::Wmts(WmtsTileSource::new(
            "/onearth/wmts/epsg4326/wmts.cgi?",
            "blue_marble",
            "image/jpeg",
            "EPSG4326_1km",
            "default",
            grid(),
        ));

        let url = source.tile_url(&TileCoord::new(1, 3, 0)).unwrap();
        assert_eq!(
            url,
            "/onearth/wmts/epsg4326/wmts.cgi?SERVICE=WMTS&REQUEST=GetTile&VERSION=1.0.0&LAYER=blue_marble&STYLE=default&FORMAT=image%2Fjpeg&TILEMATRIXSET=EPSG4326_1km&TILEMATRIX=1&TILEROW=0&TILECOL=3&TIME=default"
        );
    }

    #[test]
    fn test_wmts_out_of_range() {
        let source = WmtsTileSource::new("/wmts.cgi?", "l", "image/png", "s", "default", grid());
        assert!(matches!(
            source.raw_tile_url(&TileCoord::new(3, 0, 0)),
            Err(ViewerError::TileOutOfRange { zoom: 3, .. })
        ));
    }

    #[test]
    fn test_vector_tile_url() {
        let source = TileSource::Vector(VectorTileSource::new(
            "/wmts/epsg3857/all/wmts.cgi",
            "oscar",
            "GoogleMapsCompatible_Level6",
            XyzGrid::new(5),
        ));

        let url = source.tile_url(&TileCoord::new(2, 1, 3)).unwrap();
        assert_eq!(
            url,
            "/wmts/epsg3857/all/wmts.cgi?layer=oscar&tilematrixset=GoogleMapsCompatible_Level6&Service=WMTS&Request=GetTile&Version=1.0.0&Format=application%2Fx-protobuf&TileMatrix=2&TileCol=1&TileRow=3&TIME=default"
        );
        assert!(source.tile_url(&TileCoord::new(6, 0, 0)).is_err());
    }

    #[test]
    fn test_kvp_values_are_encoded() {
        let source = WmtsTileSource::new(
            "/wmts.cgi?",
            "Sea Ice/Extent",
            "image/png; mode=8bit",
            "EPSG3413_1km",
            "default",
            grid(),
        );

        let url = source.raw_tile_url(&TileCoord::new(0, 0, 0)).unwrap();
        assert!(url.contains("&LAYER=Sea+Ice%2FExtent&"));
        assert!(url.contains("&FORMAT=image%2Fpng%3B+mode%3D8bit&"));
        assert!(url.contains("&TILEMATRIXSET=EPSG3413_1km&"));
        assert_eq!(
            encode_value("MODIS_Terra-CorrectedReflectance.v6"),
            "MODIS_Terra-CorrectedReflectance.v6"
        );
    }

    #[test]
    fn test_xyz_tile_url() {
        let mut source = TileSource::Xyz(XyzTileSource::new(
            "/onearth/wmts/epsg3857/BlueMarble_ShadedRelief_Bathymetry/default/GoogleMapsCompatible_Level8/{z}/{y}/{x}.jpg",
            XyzGrid::new(7),
        ));
        assert_eq!(source.kind(), "xyz");

        let url = source.tile_url(&TileCoord::new(3, 5, 2)).unwrap();
        assert_eq!(
            url,
            "/onearth/wmts/epsg3857/BlueMarble_ShadedRelief_Bathymetry/default/GoogleMapsCompatible_Level8/3/2/5.jpg?TIME=default"
        );
        assert!(matches!(
            source.tile_url(&TileCoord::new(8, 0, 0)),
            Err(ViewerError::TileOutOfRange { zoom: 8, .. })
        ));

        let filter = DateFilter::parse_picker("2021-03-05").unwrap();
        source.set_tile_load(TileLoadDecorator::new(&filter));
        let url = source.tile_url(&TileCoord::new(0, 0, 0)).unwrap();
        assert!(url.ends_with("/0/0/0.jpg?TIME=2021-03-05T00:00:00Z"));
    }

    #[test]
    fn test_set_tile_load_replaces_time() {
        let mut source = TileSource::Wmts(WmtsTileSource::new(
            "/wmts.cgi?",
            "l",
            "image/png",
            "s",
            "default",
            grid(),
        ));
        let filter = DateFilter::parse_picker("2021-03-05 14:30").unwrap();
        source.set_tile_load(TileLoadDecorator::new(&filter));

        let url = source.tile_url(&TileCoord::new(0, 0, 0)).unwrap();
        assert!(url.ends_with("&TIME=2021-03-05T14:30:00Z"));
        assert!(!url.contains("TIME=default"));
    }
}
