//! Ordered layer list with visibility, draw order and date state.
//!
//! The list is in draw order: the last entry is drawn on top. Checking a
//! layer moves it to the end and shows it; unchecking hides it in place.
//! Entries are never removed.

use serde::Serialize;

use wmts_common::{BoundingBox, CrsCode, DateFilter, TileCoord, ViewerError, ViewerResult};
use wmts_protocol::{TileLoadDecorator, TileSource};

use crate::config::ViewerConfig;
use crate::panel::CheckboxPanel;
use crate::translate::{build_static_entry, LayerDescriptor, TranslationReport};

/// A layer in the map's ordered list.
#[derive(Debug, Clone, Serialize)]
pub struct MapLayerEntry {
    /// Identifier tag used for every lookup
    pub id: String,
    /// Present for discovered layers, absent for configured ones
    pub descriptor: Option<LayerDescriptor>,
    pub source: TileSource,
    pub visible: bool,
}

impl MapLayerEntry {
    pub fn new(
        id: impl Into<String>,
        descriptor: Option<LayerDescriptor>,
        source: TileSource,
        visible: bool,
    ) -> Self {
        Self {
            id: id.into(),
            descriptor,
            source,
            visible,
        }
    }

    pub fn label(&self) -> &str {
        self.descriptor
            .as_ref()
            .map(LayerDescriptor::label)
            .unwrap_or(self.id.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LayerManager {
    entries: Vec<MapLayerEntry>,
    panel: CheckboxPanel,
    date: DateFilter,
}

impl LayerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager preloaded with the config's static layers, in config order.
    pub fn from_config(config: &ViewerConfig) -> ViewerResult<Self> {
        let projection: CrsCode = config.crs()?;
        let mut manager = Self::new();
        for layer in &config.static_layers {
            manager.add_layer(build_static_entry(layer, projection)?)?;
        }
        Ok(manager)
    }

    /// Append an entry to the top of the list and to the panel.
    ///
    /// The entry's source gets a decorator for the current date.
    pub fn add_layer(&mut self, mut entry: MapLayerEntry) -> ViewerResult<()> {
        if self.position(&entry.id).is_some() {
            return Err(ViewerError::DuplicateLayer(entry.id));
        }

        entry
            .source
            .set_tile_load(TileLoadDecorator::new(&self.date));
        self.panel.push(&entry.id, entry.label(), entry.visible);

        tracing::debug!(
            layer = %entry.id,
            kind = entry.source.kind(),
            visible = entry.visible,
            "Added layer"
        );
        self.entries.push(entry);
        Ok(())
    }

    /// Add every entry of a translation report. Identifiers already present
    /// are skipped with a warning. Returns the number added.
    pub fn install_report(&mut self, report: TranslationReport) -> usize {
        let mut added = 0;
        for entry in report.entries {
            let id = entry.id.clone();
            match self.add_layer(entry) {
                Ok(()) => added += 1,
                Err(e) => tracing::warn!(layer = %id, error = %e, "Layer not installed"),
            }
        }
        added
    }

    /// Apply a checkbox change.
    pub fn set_checked(&mut self, id: &str, checked: bool) -> ViewerResult<()> {
        let pos = self
            .position(id)
            .ok_or_else(|| ViewerError::LayerNotFound(id.to_string()))?;

        if checked {
            let mut entry = self.entries.remove(pos);
            entry.visible = true;
            self.entries.push(entry);
        } else {
            self.entries[pos].visible = false;
        }
        self.panel.set_checked(id, checked);

        tracing::info!(layer = %id, checked, "Layer visibility changed");
        Ok(())
    }

    /// Make a new date active and reapply a fresh decorator to every layer.
    pub fn set_date(&mut self, date: DateFilter) {
        self.date = date;
        let decorator = TileLoadDecorator::new(&self.date);
        for entry in &mut self.entries {
            entry.source.set_tile_load(decorator.clone());
        }
        tracing::info!(time = %self.date, layers = self.entries.len(), "Active date changed");
    }

    pub fn clear_date(&mut self) {
        self.set_date(DateFilter::unset());
    }

    pub fn date(&self) -> &DateFilter {
        &self.date
    }

    /// Identifiers in draw order, bottom first.
    pub fn layer_order(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.id.as_str()).collect()
    }

    /// Visible entries in draw order.
    pub fn visible_layers(&self) -> Vec<&MapLayerEntry> {
        self.entries.iter().filter(|e| e.visible).collect()
    }

    pub fn entries(&self) -> &[MapLayerEntry] {
        &self.entries
    }

    pub fn entry(&self, id: &str) -> Option<&MapLayerEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn panel(&self) -> &CheckboxPanel {
        &self.panel
    }

    /// Decorated tile URL for a layer.
    pub fn tile_url(&self, id: &str, coord: &TileCoord) -> ViewerResult<String> {
        self.require(id)?.source.tile_url(coord)
    }

    /// Decorated GetMap URL for a WMS layer.
    pub fn image_url(
        &self,
        id: &str,
        bbox: &BoundingBox,
        width: u32,
        height: u32,
    ) -> ViewerResult<String> {
        match &self.require(id)?.source {
            TileSource::Wms(source) => source.image_url(bbox, width, height),
            _ => Err(ViewerError::UnsupportedOperation {
                layer: id.to_string(),
                operation: "image_url".to_string(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn require(&self, id: &str) -> ViewerResult<&MapLayerEntry> {
        self.entry(id)
            .ok_or_else(|| ViewerError::LayerNotFound(id.to_string()))
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wmts_common::TileGrid;
    use wmts_protocol::WmtsTileSource;

    fn entry(id: &str) -> MapLayerEntry {
        let grid = TileGrid {
            origin: (-180.0, 90.0),
            resolutions: vec![0.5625],
            matrix_ids: vec!["0".to_string()],
            tile_size: 512,
        };
        MapLayerEntry::new(
            id,
            None,
            TileSource::Wmts(WmtsTileSource::new(
                "/wmts.cgi?",
                id,
                "image/png",
                "250m",
                "default",
                grid,
            )),
            false,
        )
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut manager = LayerManager::new();
        manager.add_layer(entry("A")).unwrap();
        assert!(matches!(
            manager.add_layer(entry("A")),
            Err(ViewerError::DuplicateLayer(id)) if id == "A"
        ));
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.panel().len(), 1);
    }

    #[test]
    fn test_check_promotes_uncheck_keeps_position() {
        let mut manager = LayerManager::new();
        for id in ["A", "B", "C"] {
            manager.add_layer(entry(id)).unwrap();
        }

        manager.set_checked("A", true).unwrap();
        assert_eq!(manager.layer_order(), vec!["B", "C", "A"]);

        manager.set_checked("A", false).unwrap();
        assert_eq!(manager.layer_order(), vec!["B", "C", "A"]);
        assert!(manager.visible_layers().is_empty());
    }

    #[test]
    fn test_unknown_layer() {
        let mut manager = LayerManager::new();
        assert!(matches!(
            manager.set_checked("nope", true),
            Err(ViewerError::LayerNotFound(_))
        ));
        assert!(manager.tile_url("nope", &TileCoord::new(0, 0, 0)).is_err());
    }

    #[test]
    fn test_image_url_requires_wms_source() {
        let mut manager = LayerManager::new();
        manager.add_layer(entry("A")).unwrap();
        assert!(matches!(
            manager.image_url("A", &BoundingBox::symmetric(1.0), 10, 10),
            Err(ViewerError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn test_added_layer_uses_current_date() {
        let mut manager = LayerManager::new();
        manager.set_date(DateFilter::parse_picker("2021-03-05").unwrap());
        manager.add_layer(entry("A")).unwrap();

        let url = manager.tile_url("A", &TileCoord::new(0, 0, 0)).unwrap();
        assert!(url.ends_with("&TIME=2021-03-05T00:00:00Z"));
    }
}
