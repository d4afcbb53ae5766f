//! Export error types.

use thiserror::Error;

/// Errors from encoding or batch export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Image encoding failed.
    #[error("encode failed: {0}")]
    Encode(#[from] image::ImageError),

    /// LUT serialization failed.
    #[error(transparent)]
    Lut(#[from] grade_lut::LutError),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid export parameters.
    #[error("invalid export settings: {0}")]
    InvalidSettings(String),
}

/// Result alias for export operations.
pub type ExportResult<T> = Result<T, ExportError>;
