//! # grade-ops
//!
//! The grade "program": everything that turns an
//! [`AdjustmentState`](grade_core::AdjustmentState) plus masks plus a
//! LUT into an evaluable per-pixel color transform.
//!
//! The same fixed-order chain exists in two forms that must agree
//! within float rounding:
//!
//! - [`chain`] / [`cpu`] - pure Rust reference, used for LUT baking,
//!   the CPU render path and tests
//! - [`shaders`] - WGSL compute kernels executed by `grade-gpu`, fed
//!   by the Pod structs in [`uniforms`]
//!
//! # Transform order
//!
//! The visual result is order-dependent; the chain must not be
//! reordered: exposure, temperature/tint, contrast, saturation,
//! vibrance, shadows/highlights, whites/blacks, clarity/dehaze, fade,
//! then local masks (composited in list order), then the LUT blend,
//! then output-only spatial effects (halation, grain, vignette).

#![warn(missing_docs)]

pub mod bake;
pub mod chain;
pub mod cpu;
pub mod shaders;
pub mod uniforms;

pub use chain::{grade_color, GradeStack};
pub use cpu::{render_reference, RenderOptions};
pub use uniforms::{GlobalUniforms, GradeParams, MaskUniform, MAX_MASKS};
