//! 8-bit image encoding.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use grade_core::ImageBuffer;

use crate::{ExportError, ExportResult};

/// Output container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Lossless PNG.
    Png,
    /// JPEG with quality 1..=100. Alpha is dropped.
    Jpeg {
        /// Encoder quality.
        quality: u8,
    },
}

impl ExportFormat {
    /// Picks a format from a file extension.
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg { quality: 90 }),
            _ => None,
        }
    }
}

/// Encodes a rendered image to an in-memory file.
pub fn encode(image: &ImageBuffer, format: ExportFormat) -> ExportResult<Vec<u8>> {
    let mut out = Vec::new();
    match format {
        ExportFormat::Png => {
            let (pixels, color) = quantize(image, image.channels() == 4);
            PngEncoder::new(&mut out).write_image(
                &pixels,
                image.width(),
                image.height(),
                color,
            )?;
        }
        ExportFormat::Jpeg { quality } => {
            if quality == 0 || quality > 100 {
                return Err(ExportError::InvalidSettings(format!(
                    "JPEG quality {quality} outside 1..=100"
                )));
            }
            // JPEG has no alpha channel.
            let (pixels, color) = quantize(image, false);
            JpegEncoder::new_with_quality(&mut out, quality).write_image(
                &pixels,
                image.width(),
                image.height(),
                color,
            )?;
        }
    }
    Ok(out)
}

/// Encodes and writes to disk in one step.
pub fn save<P: AsRef<Path>>(path: P, image: &ImageBuffer, format: ExportFormat) -> ExportResult<()> {
    let bytes = encode(image, format)?;
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    std::io::Write::write_all(&mut writer, &bytes)?;
    Ok(())
}

fn quantize(image: &ImageBuffer, keep_alpha: bool) -> (Vec<u8>, ExtendedColorType) {
    let channels = image.channels();
    if keep_alpha && channels == 4 {
        (image.to_u8(), ExtendedColorType::Rgba8)
    } else if channels == 3 {
        (image.to_u8(), ExtendedColorType::Rgb8)
    } else {
        // RGBA source, alpha dropped.
        let data = image.data();
        let mut out = Vec::with_capacity(data.len() / 4 * 3);
        for px in data.chunks_exact(4) {
            for v in &px[..3] {
                out.push((v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8);
            }
        }
        (out, ExtendedColorType::Rgb8)
    }
}
