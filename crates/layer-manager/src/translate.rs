//! Capabilities to map layer translation.
//!
//! Each `Contents/Layer` record becomes one hidden [`MapLayerEntry`] whose
//! source is either a raster WMTS source on the configured endpoint or, for
//! configured vector layers, an MVT source on an XYZ grid. Layers that
//! cannot be built are reported, not fatal.

use std::fmt;

use serde::Serialize;

use wmts_common::{CrsCode, TileGrid, ViewerError, ViewerResult, XyzGrid};
use wmts_protocol::{
    Capabilities, LayerRecord, TileSource, TimeDimension, VectorTileSource, WmsImageSource,
    WmtsTileSource, XyzTileSource,
};

use crate::config::{StaticLayerConfig, StaticSourceConfig, ViewerConfig};
use crate::manager::MapLayerEntry;

/// Immutable description of a discovered layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerDescriptor {
    pub identifier: String,
    pub title: Option<String>,
    pub formats: Vec<String>,
    pub tile_matrix_sets: Vec<String>,
    pub style: String,
    pub time: Option<TimeDimension>,
    pub is_vector: bool,
}

impl LayerDescriptor {
    pub fn from_record(record: &LayerRecord, is_vector: bool) -> Self {
        Self {
            identifier: record.identifier.clone(),
            title: record.title.clone(),
            formats: record.formats.clone(),
            tile_matrix_sets: record.tile_matrix_set_links.clone(),
            style: record.default_style().to_string(),
            time: record.time.clone(),
            is_vector,
        }
    }

    /// Label shown next to the layer's checkbox.
    pub fn label(&self) -> &str {
        &self.identifier
    }
}

/// Why a layer record produced no map layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    NoTileMatrixSetLink,
    MissingTileMatrixSet { matrix_set: String },
    EmptyTileMatrixSet { matrix_set: String },
    NoFormat,
    UnparseableVectorLevels { matrix_set: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoTileMatrixSetLink => write!(f, "layer links no tile matrix set"),
            SkipReason::MissingTileMatrixSet { matrix_set } => {
                write!(f, "tile matrix set '{}' not found in capabilities", matrix_set)
            }
            SkipReason::EmptyTileMatrixSet { matrix_set } => {
                write!(f, "tile matrix set '{}' has no matrices", matrix_set)
            }
            SkipReason::NoFormat => write!(f, "layer advertises no format"),
            SkipReason::UnparseableVectorLevels { matrix_set } => write!(
                f,
                "cannot derive vector zoom levels from '{}'",
                matrix_set
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedLayer {
    pub identifier: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Result of translating one capabilities document.
#[derive(Debug, Clone, Default)]
pub struct TranslationReport {
    /// Built entries, in document order, all hidden
    pub entries: Vec<MapLayerEntry>,
    pub skipped: Vec<SkippedLayer>,
}

/// Translate every layer record of a capabilities document.
pub fn translate_capabilities(
    caps: &Capabilities,
    config: &ViewerConfig,
    projection: CrsCode,
) -> TranslationReport {
    let mut report = TranslationReport::default();

    for record in &caps.layers {
        match translate_layer(caps, record, config, projection) {
            Ok(entry) => report.entries.push(entry),
            Err(reason) => {
                tracing::warn!(
                    layer = %record.identifier,
                    reason = %reason,
                    "Skipping layer"
                );
                report.skipped.push(SkippedLayer {
                    identifier: record.identifier.clone(),
                    reason,
                });
            }
        }
    }

    tracing::info!(
        layers = report.entries.len(),
        skipped = report.skipped.len(),
        crs = %projection,
        "Translated capabilities"
    );

    report
}

fn translate_layer(
    caps: &Capabilities,
    record: &LayerRecord,
    config: &ViewerConfig,
    projection: CrsCode,
) -> Result<MapLayerEntry, SkipReason> {
    let set_id = record
        .primary_tile_matrix_set()
        .ok_or(SkipReason::NoTileMatrixSetLink)?;

    let set = caps
        .find_tile_matrix_set(set_id)
        .ok_or_else(|| SkipReason::MissingTileMatrixSet {
            matrix_set: set_id.to_string(),
        })?;

    let grid = set
        .tile_grid(projection.meters_per_unit())
        .ok_or_else(|| SkipReason::EmptyTileMatrixSet {
            matrix_set: set_id.to_string(),
        })?;

    let is_vector = config.is_vector_layer(&record.identifier);
    let descriptor = LayerDescriptor::from_record(record, is_vector);

    let source = if is_vector {
        let xyz = XyzGrid::from_matrix_set_name(set_id).ok_or_else(|| {
            SkipReason::UnparseableVectorLevels {
                matrix_set: set_id.to_string(),
            }
        })?;
        TileSource::Vector(VectorTileSource::new(
            &config.vector_endpoint_url,
            &record.identifier,
            set_id,
            xyz,
        ))
    } else {
        let format = record.primary_format().ok_or(SkipReason::NoFormat)?;
        TileSource::Wmts(WmtsTileSource::new(
            &config.endpoint_url,
            &record.identifier,
            format,
            set_id,
            &descriptor.style,
            grid,
        ))
    };

    tracing::debug!(
        layer = %record.identifier,
        kind = source.kind(),
        matrix_set = set_id,
        "Built layer source"
    );

    Ok(MapLayerEntry::new(
        record.identifier.clone(),
        Some(descriptor),
        source,
        false,
    ))
}

/// Build an entry for a layer fully described in configuration.
pub fn build_static_entry(
    layer: &StaticLayerConfig,
    projection: CrsCode,
) -> ViewerResult<MapLayerEntry> {
    let source = match &layer.source {
        StaticSourceConfig::Wmts {
            url,
            layer: name,
            format,
            matrix_set,
            origin,
            resolutions,
            matrix_ids,
            tile_size,
            style,
        } => {
            if resolutions.is_empty() {
                return Err(ViewerError::Config(format!(
                    "Static layer '{}' has no resolutions",
                    layer.identifier
                )));
            }

            let matrix_ids = if matrix_ids.is_empty() {
                (0..resolutions.len()).map(|z| z.to_string()).collect()
            } else if matrix_ids.len() == resolutions.len() {
                matrix_ids.clone()
            } else {
                return Err(ViewerError::Config(format!(
                    "Static layer '{}' has {} matrix ids for {} resolutions",
                    layer.identifier,
                    matrix_ids.len(),
                    resolutions.len()
                )));
            };

            let grid = TileGrid {
                origin: (origin[0], origin[1]),
                resolutions: resolutions.clone(),
                matrix_ids,
                tile_size: *tile_size,
            };

            TileSource::Wmts(WmtsTileSource::new(
                url,
                name.as_deref().unwrap_or(&layer.identifier),
                format,
                matrix_set,
                style,
                grid,
            ))
        }
        StaticSourceConfig::Xyz {
            url_template,
            max_zoom,
        } => {
            if let Some(missing) = ["{z}", "{x}", "{y}"]
                .into_iter()
                .find(|p| !url_template.contains(p))
            {
                return Err(ViewerError::Config(format!(
                    "Static layer '{}' url_template has no {} placeholder",
                    layer.identifier, missing
                )));
            }
            TileSource::Xyz(XyzTileSource::new(url_template, XyzGrid::new(*max_zoom)))
        }
        StaticSourceConfig::Wms {
            url,
            layers,
            format,
            version,
        } => TileSource::Wms(
            WmsImageSource::new(url, layers, format, projection).with_version(version),
        ),
    };

    Ok(MapLayerEntry::new(
        layer.identifier.clone(),
        None,
        source,
        layer.visible,
    ))
}
