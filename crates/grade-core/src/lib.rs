//! # grade-core
//!
//! Core types for the filmgrade color-grading pipeline.
//!
//! This crate holds the data model every other crate consumes:
//!
//! - [`AdjustmentState`] - the canonical serializable record of grading
//!   parameters (global, and duplicated per-mask as an override)
//! - [`Mask`] - radial/linear local-adjustment masks with coverage math
//! - [`ImageBuffer`] - interleaved f32 pixel buffer shared by the GPU
//!   upload path, the scope analyzers and the encoders
//! - [`ImageSession`] - one loaded image plus its grading state
//! - [`Error`] - the unified error taxonomy
//!
//! # Design
//!
//! The render pipeline is a pure function of this state: nothing in this
//! crate touches the GPU, and nothing here is mutated by a render.
//!
//! # Used By
//!
//! - `grade-ops` - transform chain and uniform packing
//! - `grade-gpu` - render pipeline
//! - `grade-scopes` / `grade-export` - downstream consumers

#![warn(missing_docs)]

mod adjustments;
mod error;
mod image;
mod mask;
mod session;

pub use adjustments::AdjustmentState;
pub use error::{Error, Result};
pub use image::ImageBuffer;
pub use mask::{Mask, MaskId, MaskShape, RasterMask};
pub use session::{ImageSession, SessionSnapshot};
