//! Interleaved f32 image buffer.
//!
//! The one pixel-format contract shared by GPU upload, scope analyzers
//! and the encoders: row-major, interleaved, normalized [0,1] f32
//! components, 3 (RGB) or 4 (RGBA) channels.
//!
//! ```text
//! Memory: [R G B R G B ...]  <- Row 0
//!         [R G B R G B ...]  <- Row 1
//! ```

use crate::{Error, Result};

/// Owned row-major interleaved f32 pixel buffer.
///
/// # Example
///
/// ```rust
/// use grade_core::ImageBuffer;
///
/// let mut img = ImageBuffer::new(64, 48, 3).unwrap();
/// img.set_pixel(10, 10, [1.0, 0.5, 0.25]);
/// assert_eq!(img.pixel(10, 10), [1.0, 0.5, 0.25]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    data: Vec<f32>,
    width: u32,
    height: u32,
    channels: u32,
}

impl ImageBuffer {
    /// Creates a zero-filled buffer. `channels` must be 3 or 4.
    pub fn new(width: u32, height: u32, channels: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Format(format!("invalid dimensions {width}x{height}")));
        }
        if channels != 3 && channels != 4 {
            return Err(Error::Format(format!("unsupported channel count {channels}")));
        }
        let len = width as usize * height as usize * channels as usize;
        Ok(Self { data: vec![0.0; len], width, height, channels })
    }

    /// Wraps existing interleaved data.
    pub fn from_data(data: Vec<f32>, width: u32, height: u32, channels: u32) -> Result<Self> {
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(Error::Format(format!(
                "buffer length {} does not match {}x{}x{}",
                data.len(),
                width,
                height,
                channels
            )));
        }
        if channels != 3 && channels != 4 {
            return Err(Error::Format(format!("unsupported channel count {channels}")));
        }
        Ok(Self { data, width, height, channels })
    }

    /// Converts 8-bit interleaved pixels into a normalized buffer.
    pub fn from_u8(data: &[u8], width: u32, height: u32, channels: u32) -> Result<Self> {
        let floats = data.iter().map(|&v| v as f32 / 255.0).collect();
        Self::from_data(floats, width, height, channels)
    }

    /// Buffer filled with one constant color. Handy in tests.
    pub fn splat(width: u32, height: u32, rgb: [f32; 3]) -> Result<Self> {
        let mut img = Self::new(width, height, 3)?;
        for px in img.data.chunks_exact_mut(3) {
            px.copy_from_slice(&rgb);
        }
        Ok(img)
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Channels per pixel (3 or 4).
    #[inline]
    pub fn channels(&self) -> u32 {
        self.channels
    }

    /// Raw interleaved component slice.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable interleaved component slice.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels as usize
    }

    /// RGB at (x, y). Panics outside bounds, like slice indexing.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 3] {
        let o = self.offset(x, y);
        [self.data[o], self.data[o + 1], self.data[o + 2]]
    }

    /// Writes RGB at (x, y), leaving alpha untouched when present.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [f32; 3]) {
        let o = self.offset(x, y);
        self.data[o] = rgb[0];
        self.data[o + 1] = rgb[1];
        self.data[o + 2] = rgb[2];
    }

    /// Quantizes to 8-bit with clamping, preserving channel layout.
    pub fn to_u8(&self) -> Vec<u8> {
        self.data
            .iter()
            .map(|v| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8)
            .collect()
    }

    /// Nearest-neighbor downscale used when comparing preview output
    /// against a native-resolution render in tests.
    pub fn downscale_nearest(&self, width: u32, height: u32) -> Result<Self> {
        let mut out = Self::new(width, height, self.channels)?;
        for y in 0..height {
            let sy = (y as u64 * self.height as u64 / height as u64) as u32;
            for x in 0..width {
                let sx = (x as u64 * self.width as u64 / width as u64) as u32;
                let rgb = self.pixel(sx.min(self.width - 1), sy.min(self.height - 1));
                out.set_pixel(x, y, rgb);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffer() {
        assert!(ImageBuffer::from_data(vec![0.0; 10], 2, 2, 3).is_err());
    }

    #[test]
    fn rejects_two_channel_layout() {
        assert!(ImageBuffer::new(4, 4, 2).is_err());
    }

    #[test]
    fn u8_round_trip_within_one_step() {
        let img = ImageBuffer::from_u8(&[0, 128, 255, 64, 32, 200], 2, 1, 3).unwrap();
        let back = img.to_u8();
        assert_eq!(back, vec![0, 128, 255, 64, 32, 200]);
    }

    #[test]
    fn downscale_of_flat_image_is_flat() {
        let img = ImageBuffer::splat(100, 100, [0.25, 0.5, 0.75]).unwrap();
        let small = img.downscale_nearest(10, 10).unwrap();
        for y in 0..10 {
            for x in 0..10 {
                assert_eq!(small.pixel(x, y), [0.25, 0.5, 0.75]);
            }
        }
    }
}
