//! # grade-lut
//!
//! 3D color lookup tables for the filmgrade pipeline.
//!
//! A [`Lut3D`] maps RGB input to graded RGB output through a cube of
//! samples with trilinear interpolation. The same table feeds two
//! consumers that must agree:
//!
//! - the GPU path, which flattens the cube into a storage buffer
//! - the CPU path, which samples it directly for LUT baking and tests
//!
//! # Supported format
//!
//! `.cube` (Adobe/Resolve) text files via the [`cube`] module:
//!
//! ```text
//! # Comment
//! TITLE "Grade Name"
//! LUT_3D_SIZE 33
//! DOMAIN_MIN 0.0 0.0 0.0
//! DOMAIN_MAX 1.0 1.0 1.0
//! 0.0 0.0 0.0
//! ...
//! ```
//!
//! Parsing is deliberately lenient: grading should degrade gracefully
//! rather than block editing. See [`cube::parse_str`] for the recovery
//! policy and [`cube::parse_strict`] for the rejecting variant.
//!
//! # Used By
//!
//! - `grade-ops` - LUT application inside the transform chain, baking
//! - `grade-gpu` - upload as a flattened storage buffer

#![warn(missing_docs)]

pub mod cube;
mod error;
mod lut3d;

pub use error::{LutError, LutResult};
pub use lut3d::Lut3D;
