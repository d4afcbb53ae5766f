//! # grade-gpu
//!
//! wgpu compute renderer for the grading pipeline.
//!
//! # Overview
//!
//! - [`GpuContext`] - adapter/device bring-up and pipeline compilation
//! - [`Renderer`] - image upload, snapshot staging, the preview and
//!   native-resolution render paths, region readback, loss recovery
//! - [`StateTracker`] - lifecycle rules, testable without a GPU
//!
//! The kernels and their uniform layouts live in `grade-ops` so the
//! CPU reference path shares them; this crate only owns the device
//! plumbing.
//!
//! # Example
//!
//! ```rust,no_run
//! use grade_core::ImageBuffer;
//! use grade_gpu::{Renderer, RenderSnapshot};
//!
//! # fn main() -> Result<(), grade_gpu::GpuError> {
//! let mut renderer = Renderer::new()?;
//! let image = ImageBuffer::splat(1920, 1080, [0.5, 0.5, 0.5]).unwrap();
//! renderer.load_image(&image)?;
//! renderer.set_preview_size(960, 540)?;
//!
//! let mut snapshot = RenderSnapshot {
//!     adjustments: Default::default(),
//!     masks: Vec::new(),
//!     grain_seed: 0.0,
//! };
//! snapshot.adjustments.exposure = 0.5;
//! renderer.stage(snapshot);
//! let preview = renderer.render()?;
//! # let _ = preview;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod context;
mod error;
mod renderer;
mod state;

pub use context::GpuContext;
pub use error::{GpuError, GpuResult};
pub use renderer::{RenderSnapshot, Renderer};
pub use state::{PipelineState, StateTracker};
