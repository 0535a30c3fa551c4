//! Error types for the collage compositor

use thiserror::Error;

/// Result type alias for compositor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while composing or exporting a collage
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// Image count does not match the grid, or the grid geometry is degenerate
    #[error("Invalid grid: {0}")]
    InvalidGridError(String),

    /// A source image could not be decoded
    #[error("Failed to decode image {index}: {reason}")]
    ImageDecodeError { index: usize, reason: String },

    /// The drawing surface could not be acquired
    #[error("Render surface unavailable: {0}")]
    RenderSurfaceUnavailableError(String),

    /// Failed to serialize or save a composed surface
    #[error("Export failed: {0}")]
    ExportError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// A draw plan was malformed or a draw step failed
    #[error("Rendering failed: {0}")]
    RenderError(String),
}

impl Error {
    /// Index of the offending image for decode failures
    pub fn image_index(&self) -> Option<usize> {
        match self {
            Error::ImageDecodeError { index, .. } => Some(*index),
            _ => None,
        }
    }
}
