//! # grade-scopes
//!
//! Image analyzers driving the scope displays: per-channel
//! [`Histogram`], column [`Waveform`] and chroma [`Vectorscope`].
//!
//! All analyzers read the rendered [`ImageBuffer`](grade_core::ImageBuffer)
//! (post-grade, clamped [0,1]) and are pure functions of it. Rows are
//! accumulated in parallel and merged, so results are deterministic.

#![warn(missing_docs)]

mod histogram;
mod vectorscope;
mod waveform;

pub use histogram::Histogram;
pub use vectorscope::Vectorscope;
pub use waveform::Waveform;

/// Rec.709 luma weights shared by all analyzers.
pub(crate) const LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Quantizes a normalized value into one of 256 bins.
#[inline]
pub(crate) fn bin256(v: f32) -> usize {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as usize
}
