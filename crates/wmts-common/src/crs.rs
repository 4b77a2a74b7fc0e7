//! Coordinate reference systems supported by the viewer and their static
//! view parameters.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::BoundingBox;

/// Polar stereographic grids are clamped to this half-width (meters).
pub const POLAR_HALF_EXTENT: f64 = 4194304.0;

/// Web Mercator half-width as used by the view table.
pub const MERCATOR_VIEW_HALF_EXTENT: f64 = 20037508.34;

/// Meters per degree at the WGS84 equator.
pub const METERS_PER_DEGREE: f64 = std::f64::consts::PI * 6378137.0 / 180.0;

/// Well-known CRS codes supported by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lat/lon in degrees)
    #[serde(rename = "EPSG:4326")]
    Epsg4326,
    /// Web Mercator (meters)
    #[serde(rename = "EPSG:3857")]
    Epsg3857,
    /// Polar Stereographic North
    #[serde(rename = "EPSG:3413")]
    Epsg3413,
    /// Polar Stereographic South
    #[serde(rename = "EPSG:3031")]
    Epsg3031,
}

/// Fixed view parameters for a CRS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewParameters {
    /// Resolution (units per pixel) at zoom 0
    pub max_resolution: f64,
    /// Usable view extent
    pub extent: BoundingBox,
}

impl CrsCode {
    pub const ALL: [CrsCode; 4] = [
        CrsCode::Epsg4326,
        CrsCode::Epsg3857,
        CrsCode::Epsg3413,
        CrsCode::Epsg3031,
    ];

    /// Parse a CRS string.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326"
    /// - "epsg:3413"
    /// - "CRS:84" (equivalent to EPSG:4326)
    /// - "EPSG:900913" (legacy Web Mercator)
    pub fn from_wms_string(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();

        match normalized.as_str() {
            "EPSG:4326" | "CRS:84" => Ok(CrsCode::Epsg4326),
            "EPSG:3857" | "EPSG:900913" => Ok(CrsCode::Epsg3857),
            "EPSG:3413" => Ok(CrsCode::Epsg3413),
            "EPSG:3031" => Ok(CrsCode::Epsg3031),
            _ => Err(CrsParseError::UnsupportedCrs(s.to_string())),
        }
    }

    /// Static (max resolution, extent) pair for the map view.
    pub fn view_parameters(&self) -> ViewParameters {
        match self {
            CrsCode::Epsg4326 => ViewParameters {
                max_resolution: 0.5625,
                extent: BoundingBox::new(-180.0, -90.0, 180.0, 90.0),
            },
            CrsCode::Epsg3857 => ViewParameters {
                max_resolution: 156543.03390625,
                extent: BoundingBox::symmetric(MERCATOR_VIEW_HALF_EXTENT),
            },
            CrsCode::Epsg3413 | CrsCode::Epsg3031 => ViewParameters {
                max_resolution: 8192.0,
                extent: BoundingBox::symmetric(POLAR_HALF_EXTENT),
            },
        }
    }

    /// Meters per projection unit, used to turn scale denominators into
    /// resolutions.
    pub fn meters_per_unit(&self) -> f64 {
        match self {
            CrsCode::Epsg4326 => METERS_PER_DEGREE,
            _ => 1.0,
        }
    }

    /// Polar systems need a proj definition registered before use.
    pub fn is_polar(&self) -> bool {
        matches!(self, CrsCode::Epsg3413 | CrsCode::Epsg3031)
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326)
    }

    /// WMS 1.3.0 uses lat/lon axis order for EPSG:4326.
    pub fn lat_lon_axis_order(&self) -> bool {
        self.is_geographic()
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            CrsCode::Epsg4326 => "EPSG:4326",
            CrsCode::Epsg3857 => "EPSG:3857",
            CrsCode::Epsg3413 => "EPSG:3413",
            CrsCode::Epsg3031 => "EPSG:3031",
        };
        write!(f, "{}", code)
    }
}

/// A registered projection: proj-string definition plus usable extent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionDef {
    pub code: CrsCode,
    pub proj4: &'static str,
    pub extent: BoundingBox,
    pub meters_per_unit: f64,
}

/// Process-wide projection definitions, built once at startup.
#[derive(Debug, Clone)]
pub struct ProjectionRegistry {
    defs: HashMap<CrsCode, ProjectionDef>,
}

impl ProjectionRegistry {
    /// Registry holding all four supported systems. Polar systems get their
    /// stereographic definitions and the clamped square extent.
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            defs: HashMap::new(),
        };

        registry.register(ProjectionDef {
            code: CrsCode::Epsg4326,
            proj4: "+proj=longlat +datum=WGS84 +no_defs",
            extent: BoundingBox::new(-180.0, -90.0, 180.0, 90.0),
            meters_per_unit: CrsCode::Epsg4326.meters_per_unit(),
        });
        registry.register(ProjectionDef {
            code: CrsCode::Epsg3857,
            proj4: "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +nadgrids=@null +wktext +no_defs",
            extent: BoundingBox::symmetric(20037508.342789244),
            meters_per_unit: 1.0,
        });
        registry.register(ProjectionDef {
            code: CrsCode::Epsg3413,
            proj4: "+proj=stere +lat_0=90 +lat_ts=70 +lon_0=-45 +k=1 +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs",
            extent: BoundingBox::symmetric(POLAR_HALF_EXTENT),
            meters_per_unit: 1.0,
        });
        registry.register(ProjectionDef {
            code: CrsCode::Epsg3031,
            proj4: "+proj=stere +lat_0=-90 +lat_ts=-71 +lon_0=0 +k=1 +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs",
            extent: BoundingBox::symmetric(POLAR_HALF_EXTENT),
            meters_per_unit: 1.0,
        });

        registry
    }

    /// Register (or replace) a definition. Polar extents are always clamped.
    pub fn register(&mut self, mut def: ProjectionDef) {
        if def.code.is_polar() {
            def.extent = BoundingBox::symmetric(POLAR_HALF_EXTENT);
        }
        tracing::debug!(crs = %def.code, proj4 = def.proj4, "Registered projection");
        self.defs.insert(def.code, def);
    }

    pub fn get(&self, code: CrsCode) -> Option<&ProjectionDef> {
        self.defs.get(&code)
    }
}

impl Default for ProjectionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}
