//! WMTS tile matrix sets and the tile grids derived from them.
//!
//! A capabilities document describes each zoom level by its scale
//! denominator. The grid a client fetches against needs resolutions in
//! projection units, which depend on the map projection's meters-per-unit.

use serde::{Deserialize, Serialize};

/// Standard rendering pixel size in meters (OGC WMTS, 0.28mm).
pub const STANDARD_PIXEL_SIZE: f64 = 0.28e-3;

/// Prefix of the vector tile matrix set names that encode a level count.
pub const GOOGLE_MAPS_LEVEL_PREFIX: &str = "GoogleMapsCompatible_Level";

/// A tile coordinate (z/x/y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level (index into the grid's matrix list)
    pub z: u32,
    /// Column (x)
    pub x: u32,
    /// Row (y)
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }
}

/// A single tile matrix (zoom level) definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMatrix {
    /// Identifier (usually zoom level as string)
    pub identifier: String,

    /// Scale denominator
    pub scale_denominator: f64,

    /// Top-left corner coordinates
    pub top_left_corner: (f64, f64),

    /// Tile width in pixels
    pub tile_width: u32,

    /// Tile height in pixels
    pub tile_height: u32,

    /// Number of tile columns
    pub matrix_width: u32,

    /// Number of tile rows
    pub matrix_height: u32,
}

impl TileMatrix {
    /// Resolution (projection units per pixel) for this matrix.
    pub fn resolution(&self, meters_per_unit: f64) -> f64 {
        self.scale_denominator * STANDARD_PIXEL_SIZE / meters_per_unit
    }
}

/// A tile matrix set as declared by a capabilities document.
///
/// Matrices keep document order, which is assumed coarse-to-fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMatrixSet {
    /// Identifier for the tile matrix set
    pub identifier: String,

    /// Supported CRS URN, if declared
    pub supported_crs: Option<String>,

    /// Individual tile matrices (zoom levels)
    pub tile_matrices: Vec<TileMatrix>,
}

impl TileMatrixSet {
    /// Matrix identifiers in declared order.
    pub fn matrix_ids(&self) -> Vec<String> {
        self.tile_matrices
            .iter()
            .map(|m| m.identifier.clone())
            .collect()
    }

    /// Resolutions in declared order. No sorting is applied.
    pub fn resolutions(&self, meters_per_unit: f64) -> Vec<f64> {
        self.tile_matrices
            .iter()
            .map(|m| m.resolution(meters_per_unit))
            .collect()
    }

    /// Build the client tile grid for a map projection.
    ///
    /// Origin comes from the first matrix's top-left corner and tile size
    /// from its tile height. Returns `None` for a set with no matrices.
    pub fn tile_grid(&self, meters_per_unit: f64) -> Option<TileGrid> {
        let first = self.tile_matrices.first()?;
        Some(TileGrid {
            origin: first.top_left_corner,
            resolutions: self.resolutions(meters_per_unit),
            matrix_ids: self.matrix_ids(),
            tile_size: first.tile_height,
        })
    }
}

/// Grid parameters for a raster WMTS source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    pub origin: (f64, f64),
    pub resolutions: Vec<f64>,
    pub matrix_ids: Vec<String>,
    pub tile_size: u32,
}

impl TileGrid {
    /// Highest zoom index the grid can serve.
    pub fn max_zoom(&self) -> Option<u32> {
        self.resolutions.len().checked_sub(1).map(|z| z as u32)
    }

    /// Matrix identifier for a zoom index.
    pub fn matrix_id(&self, z: u32) -> Option<&str> {
        self.matrix_ids.get(z as usize).map(String::as_str)
    }
}

/// An XYZ grid as used by vector tile sources.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XyzGrid {
    pub max_zoom: u32,
    pub tile_size: u32,
}

impl XyzGrid {
    pub fn new(max_zoom: u32) -> Self {
        Self {
            max_zoom,
            tile_size: 256,
        }
    }

    /// Build the grid for a `GoogleMapsCompatible_LevelN` matrix set, where
    /// `N` counts levels and the max zoom is `N - 1`.
    pub fn from_matrix_set_name(name: &str) -> Option<Self> {
        let levels = google_maps_level_count(name)?;
        levels.checked_sub(1).map(Self::new)
    }
}

/// Number of levels encoded in a `GoogleMapsCompatible_LevelN` set name.
pub fn google_maps_level_count(name: &str) -> Option<u32> {
    let rest = name.strip_prefix(GOOGLE_MAPS_LEVEL_PREFIX)?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
