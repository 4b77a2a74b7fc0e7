//! Viewer configuration.
//!
//! One `ViewerConfig` replaces the per-page constants of the demo viewers:
//! projection, tile endpoint, capabilities location, vector layer names and
//! zoom depth. Configs come from a built-in preset or a YAML file, which may
//! reference environment variables with `${VAR}` / `${VAR:-default}`.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use wmts_common::{CrsCode, ViewerError, ViewerResult};

/// Names accepted by [`ViewerConfig::preset`].
pub const PRESET_NAMES: [&str; 4] = ["epsg4326", "epsg3857", "epsg3413", "epsg3031"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Map projection, e.g. "EPSG:4326"
    pub projection: String,

    /// Maximum zoom level of the view
    #[serde(default = "default_max_zoom_levels")]
    pub max_zoom_levels: u32,

    /// Initial zoom level of the view
    #[serde(default = "default_initial_zoom")]
    pub initial_zoom: u32,

    /// WMTS KVP endpoint for raster tiles
    pub endpoint_url: String,

    /// Location of the capabilities document
    pub capabilities_url: String,

    /// Endpoint for vector (MVT) tiles
    #[serde(default = "default_vector_endpoint")]
    pub vector_endpoint_url: String,

    /// Layer identifiers served as vector tiles
    #[serde(default)]
    pub vector_layers: Vec<String>,

    /// Base URL used to resolve relative capabilities locations
    #[serde(default)]
    pub base_url: Option<String>,

    /// Capabilities request timeout
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Layers configured up front rather than discovered
    #[serde(default)]
    pub static_layers: Vec<StaticLayerConfig>,
}

/// A layer whose source is fully described in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticLayerConfig {
    pub identifier: String,

    #[serde(default = "default_true")]
    pub visible: bool,

    #[serde(flatten)]
    pub source: StaticSourceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StaticSourceConfig {
    /// WMTS source with an explicit grid
    Wmts {
        url: String,
        /// Server-side layer name (defaults to the identifier)
        #[serde(default)]
        layer: Option<String>,
        format: String,
        matrix_set: String,
        origin: [f64; 2],
        resolutions: Vec<f64>,
        /// Matrix identifiers (defaults to "0", "1", ...)
        #[serde(default)]
        matrix_ids: Vec<String>,
        #[serde(default = "default_tile_size")]
        tile_size: u32,
        #[serde(default = "default_style")]
        style: String,
    },
    /// Plain `{z}/{x}/{y}` tile template
    Xyz {
        url_template: String,
        max_zoom: u32,
    },
    /// WMS GetMap image source
    Wms {
        url: String,
        layers: String,
        format: String,
        #[serde(default = "default_wms_version")]
        version: String,
    },
}

fn default_max_zoom_levels() -> u32 {
    12
}

fn default_initial_zoom() -> u32 {
    1
}

fn default_vector_endpoint() -> String {
    "/wmts/epsg3857/all/wmts.cgi".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_tile_size() -> u32 {
    512
}

fn default_style() -> String {
    "default".to_string()
}

fn default_wms_version() -> String {
    "1.3.0".to_string()
}

impl ViewerConfig {
    /// Minimal config for a projection and endpoint pair.
    pub fn new(
        projection: impl Into<String>,
        endpoint_url: impl Into<String>,
        capabilities_url: impl Into<String>,
    ) -> Self {
        Self {
            projection: projection.into(),
            max_zoom_levels: default_max_zoom_levels(),
            initial_zoom: default_initial_zoom(),
            endpoint_url: endpoint_url.into(),
            capabilities_url: capabilities_url.into(),
            vector_endpoint_url: default_vector_endpoint(),
            vector_layers: Vec::new(),
            base_url: None,
            fetch_timeout_secs: default_fetch_timeout_secs(),
            static_layers: Vec::new(),
        }
    }

    /// Built-in configurations matching the stock demo viewers.
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "epsg4326" => Some(Self {
                max_zoom_levels: 12,
                ..Self::new(
                    "EPSG:4326",
                    "/wmts/epsg4326/best/wmts.cgi?",
                    "/wmts/epsg4326/best/1.0.0/WMTSCapabilities.xml",
                )
            }),
            "epsg3857" => Some(Self {
                max_zoom_levels: 7,
                vector_layers: vec![
                    "MODIS_C5_fires".to_string(),
                    "oscar".to_string(),
                    "ASCATA-L2-25km".to_string(),
                    "Terra_Orbit_Dsc_Dots".to_string(),
                ],
                static_layers: vec![StaticLayerConfig {
                    identifier: "BlueMarble_ShadedRelief_Bathymetry".to_string(),
                    visible: true,
                    source: StaticSourceConfig::Xyz {
                        url_template: "/onearth/wmts/epsg3857/BlueMarble_ShadedRelief_Bathymetry/default/GoogleMapsCompatible_Level8/{z}/{y}/{x}.jpg".to_string(),
                        max_zoom: 7,
                    },
                }],
                ..Self::new("EPSG:3857", "./wmts.cgi?", "./getCapabilities.xml")
            }),
            "epsg3413" => Some(Self {
                max_zoom_levels: 7,
                ..Self::new("EPSG:3413", "./wmts.cgi?", "./getCapabilities.xml")
            }),
            "epsg3031" => Some(Self {
                max_zoom_levels: 5,
                static_layers: vec![StaticLayerConfig {
                    identifier: "MODIS_Terra_CorrectedReflectance_TrueColor".to_string(),
                    visible: true,
                    source: StaticSourceConfig::Wmts {
                        url: "/wmts/epsg3031/all/wmts.cgi".to_string(),
                        layer: None,
                        format: "image/jpeg".to_string(),
                        matrix_set: "EPSG3031_250m".to_string(),
                        origin: [-4194304.0, 4194304.0],
                        resolutions: vec![8192.0, 4096.0, 2048.0, 1024.0, 512.0, 256.0],
                        matrix_ids: Vec::new(),
                        tile_size: 512,
                        style: default_style(),
                    },
                }],
                ..Self::new(
                    "EPSG:3031",
                    "/wmts/epsg3031/all/wmts.cgi?",
                    "/wmts/epsg3031/all/1.0.0/WMTSCapabilities.xml",
                )
            }),
            _ => None,
        }
    }

    /// Load a YAML config file, expanding environment variables first.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ViewerResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ViewerError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ViewerResult<Self> {
        let expanded = expand_env_vars(content)?;
        serde_yaml::from_str(&expanded)
            .map_err(|e| ViewerError::Config(format!("Invalid viewer config: {}", e)))
    }

    /// Parsed projection. Unsupported identifiers are rejected here so no
    /// view or grid is ever built for them.
    pub fn crs(&self) -> ViewerResult<CrsCode> {
        Ok(CrsCode::from_wms_string(&self.projection)?)
    }

    pub fn is_vector_layer(&self, identifier: &str) -> bool {
        self.vector_layers.iter().any(|v| v == identifier)
    }

    /// Absolute capabilities URL, resolving relative locations against
    /// `base_url`.
    pub fn resolved_capabilities_url(&self) -> ViewerResult<String> {
        if let Ok(url) = Url::parse(&self.capabilities_url) {
            return Ok(url.to_string());
        }

        let base = self.base_url.as_deref().ok_or_else(|| {
            ViewerError::Config(format!(
                "capabilities_url '{}' is relative and no base_url is set",
                self.capabilities_url
            ))
        })?;

        let base = Url::parse(base)
            .map_err(|e| ViewerError::Config(format!("Invalid base_url '{}': {}", base, e)))?;
        base.join(&self.capabilities_url)
            .map(|u| u.to_string())
            .map_err(|e| {
                ViewerError::Config(format!(
                    "Cannot resolve '{}' against base_url: {}",
                    self.capabilities_url, e
                ))
            })
    }

    /// Check the config before any view or layer is built.
    pub fn validate(&self) -> ViewerResult<()> {
        self.crs()?;

        if self.max_zoom_levels == 0 {
            return Err(ViewerError::Config(
                "max_zoom_levels must be greater than 0".to_string(),
            ));
        }
        if self.initial_zoom > self.max_zoom_levels {
            return Err(ViewerError::Config(format!(
                "initial_zoom {} exceeds max_zoom_levels {}",
                self.initial_zoom, self.max_zoom_levels
            )));
        }
        if self.endpoint_url.trim().is_empty() {
            return Err(ViewerError::Config("endpoint_url cannot be empty".to_string()));
        }
        if self.capabilities_url.trim().is_empty() {
            return Err(ViewerError::Config(
                "capabilities_url cannot be empty".to_string(),
            ));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ViewerError::Config(
                "fetch_timeout_secs must be greater than 0".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for layer in &self.static_layers {
            if !seen.insert(layer.identifier.as_str()) {
                return Err(ViewerError::Config(format!(
                    "Duplicate static layer identifier: {}",
                    layer.identifier
                )));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand `${VAR}` and `${VAR:-default}` references.
fn expand_env_vars(content: &str) -> ViewerResult<String> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' || chars.peek() != Some(&'{') {
            result.push(ch);
            continue;
        }
        chars.next();

        let mut var_expr = String::new();
        loop {
            match chars.next() {
                Some('}') => break,
                Some(c) => var_expr.push(c),
                None => {
                    return Err(ViewerError::Config(format!(
                        "Unclosed variable substitution: ${{{}",
                        var_expr
                    )))
                }
            }
        }

        result.push_str(&resolve_var_expr(&var_expr)?);
    }

    Ok(result)
}

fn resolve_var_expr(expr: &str) -> ViewerResult<String> {
    if let Some((name, default)) = expr.split_once(":-") {
        match std::env::var(name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).map_err(|_| {
            ViewerError::Config(format!("Environment variable {} not set", expr.trim()))
        })
    }
}
