//! 256-bin per-channel histogram.

use grade_core::ImageBuffer;
use rayon::prelude::*;

use crate::{bin256, LUMA};

/// Per-channel and luma counts over 256 bins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    /// Red channel counts.
    pub r: Vec<u32>,
    /// Green channel counts.
    pub g: Vec<u32>,
    /// Blue channel counts.
    pub b: Vec<u32>,
    /// Rec.709 luma counts.
    pub luma: Vec<u32>,
}

impl Histogram {
    /// Computes the histogram of an image.
    pub fn compute(image: &ImageBuffer) -> Self {
        let channels = image.channels() as usize;
        let row_len = image.width() as usize * channels;

        let merged = image
            .data()
            .par_chunks(row_len)
            .map(|row| {
                let mut acc = Accumulator::new();
                for px in row.chunks_exact(channels) {
                    acc.r[bin256(px[0])] += 1;
                    acc.g[bin256(px[1])] += 1;
                    acc.b[bin256(px[2])] += 1;
                    let l = px[0] * LUMA[0] + px[1] * LUMA[1] + px[2] * LUMA[2];
                    acc.luma[bin256(l)] += 1;
                }
                acc
            })
            .reduce(Accumulator::new, Accumulator::merge);

        Self {
            r: merged.r.to_vec(),
            g: merged.g.to_vec(),
            b: merged.b.to_vec(),
            luma: merged.luma.to_vec(),
        }
    }

    /// Largest count across all four series, used to scale the display.
    pub fn max_count(&self) -> u32 {
        self.r
            .iter()
            .chain(&self.g)
            .chain(&self.b)
            .chain(&self.luma)
            .copied()
            .max()
            .unwrap_or(0)
    }

    /// Fraction of pixels clipped at pure black or pure white (luma).
    pub fn clip_fractions(&self, total_pixels: u64) -> (f32, f32) {
        if total_pixels == 0 {
            return (0.0, 0.0);
        }
        (
            self.luma[0] as f32 / total_pixels as f32,
            self.luma[255] as f32 / total_pixels as f32,
        )
    }
}

struct Accumulator {
    r: Box<[u32; 256]>,
    g: Box<[u32; 256]>,
    b: Box<[u32; 256]>,
    luma: Box<[u32; 256]>,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            r: Box::new([0; 256]),
            g: Box::new([0; 256]),
            b: Box::new([0; 256]),
            luma: Box::new([0; 256]),
        }
    }

    fn merge(mut self, other: Self) -> Self {
        for i in 0..256 {
            self.r[i] += other.r[i];
            self.g[i] += other.g[i];
            self.b[i] += other.b[i];
            self.luma[i] += other.luma[i];
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_image_fills_one_bin_per_channel() {
        let img = ImageBuffer::splat(10, 10, [1.0, 0.5, 0.0]).unwrap();
        let h = Histogram::compute(&img);
        assert_eq!(h.r[255], 100);
        assert_eq!(h.g[128], 100);
        assert_eq!(h.b[0], 100);
        assert_eq!(h.r.iter().sum::<u32>(), 100);
    }

    #[test]
    fn counts_sum_to_pixel_count() {
        let mut img = ImageBuffer::new(17, 13, 3).unwrap();
        for y in 0..13 {
            for x in 0..17 {
                let v = (x * y) as f32 / (16.0 * 12.0);
                img.set_pixel(x, y, [v, 1.0 - v, v * 0.5]);
            }
        }
        let h = Histogram::compute(&img);
        for series in [&h.r, &h.g, &h.b, &h.luma] {
            assert_eq!(series.iter().sum::<u32>(), 17 * 13);
        }
    }

    #[test]
    fn clip_fractions_count_extremes() {
        let mut img = ImageBuffer::splat(10, 1, [0.0, 0.0, 0.0]).unwrap();
        for x in 0..5 {
            img.set_pixel(x, 0, [1.0, 1.0, 1.0]);
        }
        let h = Histogram::compute(&img);
        let (black, white) = h.clip_fractions(10);
        assert_eq!(black, 0.5);
        assert_eq!(white, 0.5);
    }
}
