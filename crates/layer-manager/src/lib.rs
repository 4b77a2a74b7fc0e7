//! Layer management for WMTS/WMS imagery viewers.
//!
//! Turns a capabilities document into an ordered list of map layers, keeps a
//! checkbox panel in sync with it, and applies the active date to every
//! layer's tile requests.

pub mod config;
pub mod fetch;
pub mod manager;
pub mod panel;
pub mod translate;
pub mod view;

pub use config::{StaticLayerConfig, StaticSourceConfig, ViewerConfig};
pub use fetch::{CapabilitiesClient, LoadState};
pub use manager::{LayerManager, MapLayerEntry};
pub use panel::{Checkbox, CheckboxPanel};
pub use translate::{
    build_static_entry, translate_capabilities, LayerDescriptor, SkipReason, SkippedLayer,
    TranslationReport,
};
pub use view::ViewSettings;
