//! LUT error types.

use thiserror::Error;

/// Result type for LUT operations.
pub type LutResult<T> = std::result::Result<T, LutError>;

/// Errors from LUT construction and `.cube` parsing.
#[derive(Debug, Error)]
pub enum LutError {
    /// Unreadable or structurally invalid `.cube` content.
    #[error("parse error: {0}")]
    Parse(String),

    /// Sample count does not match the declared cube size.
    #[error("invalid size: {0}")]
    InvalidSize(String),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
