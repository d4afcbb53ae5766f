//! GPU error types.

use thiserror::Error;

/// Errors from the GPU renderer.
#[derive(Debug, Error)]
pub enum GpuError {
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    /// Device creation failed.
    #[error("device creation failed: {0}")]
    DeviceCreation(String),

    /// Image exceeds the device's buffer or dimension limits.
    #[error("image too large: {width}x{height} exceeds device limit {limit}")]
    ImageTooLarge {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
        /// Largest dimension the device supports.
        limit: u32,
    },

    /// The device was lost; the renderer must be recovered before use.
    #[error("GPU context lost; call recover() to rebuild and replay")]
    ContextLost,

    /// Operation called in a state that does not allow it.
    #[error("invalid renderer state: {0}")]
    InvalidState(String),

    /// Buffer readback failed.
    #[error("buffer readback failed: {0}")]
    Readback(String),

    /// A render pass failed.
    #[error("render failed: {0}")]
    Render(String),
}

/// Result alias for GPU operations.
pub type GpuResult<T> = Result<T, GpuError>;

impl From<GpuError> for grade_core::Error {
    fn from(e: GpuError) -> Self {
        match e {
            GpuError::ContextLost => grade_core::Error::ContextLost,
            GpuError::ImageTooLarge { width, height, limit } => {
                grade_core::Error::UnsupportedFormat { width, height, limit }
            }
            other => grade_core::Error::Render(other.to_string()),
        }
    }
}
