//! Error types for the imagery viewer crates.

use thiserror::Error;

use crate::crs::CrsParseError;
use crate::time::TimeParseError;

/// Result type alias using ViewerError.
pub type ViewerResult<T> = Result<T, ViewerError>;

/// Primary error type for layer management operations.
#[derive(Debug, Error)]
pub enum ViewerError {
    // === Input Errors ===
    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Invalid CRS: {0}")]
    InvalidCrs(String),

    #[error("Invalid time specification: {0}")]
    InvalidTime(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    // === Layer Errors ===
    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Layer already exists: {0}")]
    DuplicateLayer(String),

    #[error("Tile matrix {zoom} out of range for layer '{layer}'")]
    TileOutOfRange { layer: String, zoom: u32 },

    #[error("Operation not supported by layer '{layer}': {operation}")]
    UnsupportedOperation { layer: String, operation: String },

    // === Upstream Errors ===
    #[error("Failed to parse capabilities: {0}")]
    CapabilitiesParse(String),

    #[error("Capabilities request failed: {0}")]
    Fetch(String),

    #[error("Capabilities request to {url} returned HTTP {status}")]
    FetchStatus { url: String, status: u16 },

    #[error("Request timeout")]
    Timeout,
}

impl ViewerError {
    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            ViewerError::InvalidParameter { .. }
            | ViewerError::InvalidCrs(_)
            | ViewerError::InvalidTime(_)
            | ViewerError::Config(_)
            | ViewerError::UnsupportedOperation { .. } => 400,

            ViewerError::LayerNotFound(_) | ViewerError::TileOutOfRange { .. } => 404,

            ViewerError::DuplicateLayer(_) => 409,

            ViewerError::CapabilitiesParse(_)
            | ViewerError::Fetch(_)
            | ViewerError::FetchStatus { .. } => 502,

            ViewerError::Timeout => 504,
        }
    }
}

impl From<CrsParseError> for ViewerError {
    fn from(err: CrsParseError) -> Self {
        ViewerError::InvalidCrs(err.to_string())
    }
}

impl From<TimeParseError> for ViewerError {
    fn from(err: TimeParseError) -> Self {
        ViewerError::InvalidTime(err.to_string())
    }
}
