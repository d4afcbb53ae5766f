//! CLI command implementations.

pub mod apply;
pub mod bake_lut;
pub mod batch;
pub mod scope;

use std::path::Path;

use anyhow::{Context, Result};
use grade_core::ImageBuffer;

/// Decodes an image file into a normalized f32 buffer.
pub fn load_image(path: &Path) -> Result<ImageBuffer> {
    let decoded = image::open(path)
        .with_context(|| format!("failed to load: {}", path.display()))?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();
    ImageBuffer::from_u8(rgb.as_raw(), width, height, 3)
        .with_context(|| format!("unsupported image layout: {}", path.display()))
}
