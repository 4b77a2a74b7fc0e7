//! OGC WMTS/WMS client protocol support.
//!
//! Supports:
//! - WMTS 1.0.0 capabilities parsing (layers and tile matrix sets)
//! - WMTS KVP GetTile, XYZ template and vector (MVT) tile URLs
//! - WMS GetMap image URLs

pub mod capabilities;
pub mod source;
pub mod wms;

pub use capabilities::{
    Capabilities, CapabilitiesError, LayerRecord, StyleRecord, TimeDimension,
};
pub use source::{
    encode_value, TileLoadDecorator, TileSource, VectorTileSource, WmtsTileSource, XyzTileSource,
};
pub use wms::WmsImageSource;
