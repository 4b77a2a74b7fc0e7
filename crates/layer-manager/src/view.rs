//! Map view setup for the configured projection.

use serde::Serialize;

use wmts_common::{BoundingBox, CrsCode, ProjectionRegistry, ViewerError, ViewerResult};

use crate::config::ViewerConfig;

/// Parameters of the map view, fixed once at startup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSettings {
    pub projection: CrsCode,
    pub proj4: String,
    pub max_resolution: f64,
    pub extent: BoundingBox,
    pub center: [f64; 2],
    pub zoom: u32,
    pub max_zoom: u32,
    /// Resolution per zoom level, `0..=max_zoom`
    pub resolutions: Vec<f64>,
}

impl ViewSettings {
    /// Build the view for a config. The projection must be registered so
    /// polar extents are clamped before any view is built.
    pub fn for_config(config: &ViewerConfig, registry: &ProjectionRegistry) -> ViewerResult<Self> {
        let projection = config.crs()?;
        let def = registry.get(projection).ok_or_else(|| {
            ViewerError::Config(format!("Projection {} is not registered", projection))
        })?;
        let params = projection.view_parameters();

        tracing::debug!(
            crs = %projection,
            max_resolution = params.max_resolution,
            max_zoom = config.max_zoom_levels,
            "Configured map view"
        );

        let mut view = Self {
            projection,
            proj4: def.proj4.to_string(),
            max_resolution: params.max_resolution,
            extent: params.extent,
            center: [0.0, 0.0],
            zoom: config.initial_zoom,
            max_zoom: config.max_zoom_levels,
            resolutions: Vec::new(),
        };
        view.resolutions = (0..=view.max_zoom).map(|z| view.resolution_at(z)).collect();
        Ok(view)
    }

    /// Resolution at a zoom level, halving per level.
    pub fn resolution_at(&self, zoom: u32) -> f64 {
        self.max_resolution / 2f64.powi(zoom as i32)
    }
}
