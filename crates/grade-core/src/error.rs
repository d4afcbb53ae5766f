//! Error types shared across the filmgrade pipeline.
//!
//! # Overview
//!
//! One enum covers the failure modes the pipeline distinguishes:
//!
//! - [`Error::Format`] - malformed LUT or input data; recoverable, the
//!   caller falls back to an identity/default and keeps editing
//! - [`Error::UnsupportedFormat`] - the image exceeds device limits;
//!   surfaced, operation aborted
//! - [`Error::ContextLost`] - GPU device reset; recoverable via full
//!   re-initialization and replay
//! - [`Error::Render`] - render or encode failure; surfaced, no partial
//!   output is written
//! - [`Error::Cancelled`] - user/system initiated; distinct from failure
//!   and never logged as an error
//!
//! Crate-local errors (`LutError`, `GpuError`) convert into this enum at
//! component boundaries.

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur across the grading pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input data (LUT text, snapshot JSON). Recoverable:
    /// callers degrade to an identity/default rather than blocking edits.
    #[error("format error: {0}")]
    Format(String),

    /// Image dimensions exceed what the device can hold.
    #[error("unsupported format: {width}x{height} exceeds device limit {limit}")]
    UnsupportedFormat {
        /// Source image width in pixels.
        width: u32,
        /// Source image height in pixels.
        height: u32,
        /// The device limit that was exceeded.
        limit: u32,
    },

    /// The GPU device was reset. The pipeline must be re-initialized and
    /// the caller is expected to replay load / set-adjustments / render.
    #[error("GPU context lost; re-initialize and replay")]
    ContextLost,

    /// A render or encode step failed. Nothing partial was written.
    #[error("render failed: {0}")]
    Render(String),

    /// The operation was cancelled. Not a failure.
    #[error("operation cancelled")]
    Cancelled,

    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for the cancellation status, which callers must report
    /// separately from failures.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_is_not_a_failure_category() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::Format("x".into()).is_cancelled());
    }

    #[test]
    fn unsupported_format_reports_limit() {
        let err = Error::UnsupportedFormat { width: 30000, height: 20000, limit: 16384 };
        let msg = err.to_string();
        assert!(msg.contains("30000"));
        assert!(msg.contains("16384"));
    }
}
