//! Common types shared across the imagery viewer crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod tile;
pub mod time;

pub use bbox::BoundingBox;
pub use crs::{CrsCode, ProjectionDef, ProjectionRegistry, ViewParameters};
pub use error::{ViewerError, ViewerResult};
pub use tile::{TileCoord, TileGrid, TileMatrix, TileMatrixSet, XyzGrid};
pub use time::{DateFilter, DEFAULT_TIME};
