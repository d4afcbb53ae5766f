//! Column waveform: luma distribution per image column.

use grade_core::ImageBuffer;
use rayon::prelude::*;

use crate::{bin256, LUMA};

/// Luma waveform.
///
/// Column `x` of the scope accumulates the luma values of image
/// columns that map onto it; row 0 is luma 0 (black), row 255 white.
/// Wide images are folded into at most [`Waveform::MAX_COLUMNS`]
/// scope columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Waveform {
    /// Number of scope columns.
    pub columns: u32,
    /// Counts, row-major `[row * columns + column]`, 256 rows.
    pub data: Vec<u32>,
}

impl Waveform {
    /// Display width cap.
    pub const MAX_COLUMNS: u32 = 512;

    /// Luma resolution (number of rows).
    pub const ROWS: u32 = 256;

    /// Computes the waveform of an image.
    pub fn compute(image: &ImageBuffer) -> Self {
        let width = image.width();
        let columns = width.min(Self::MAX_COLUMNS);
        let channels = image.channels() as usize;
        let row_len = width as usize * channels;

        let data = image
            .data()
            .par_chunks(row_len)
            .map(|row| {
                let mut acc = vec![0u32; (columns * Self::ROWS) as usize];
                for (x, px) in row.chunks_exact(channels).enumerate() {
                    let col = (x as u64 * columns as u64 / width as u64) as u32;
                    let l = px[0] * LUMA[0] + px[1] * LUMA[1] + px[2] * LUMA[2];
                    acc[(bin256(l) as u32 * columns + col) as usize] += 1;
                }
                acc
            })
            .reduce(
                || vec![0u32; (columns * Self::ROWS) as usize],
                |mut a, b| {
                    for (x, y) in a.iter_mut().zip(&b) {
                        *x += y;
                    }
                    a
                },
            );

        Self { columns, data }
    }

    /// Count at (column, luma row).
    pub fn at(&self, column: u32, row: u32) -> u32 {
        self.data[(row * self.columns + column) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_image_concentrates_in_one_row() {
        let img = ImageBuffer::splat(32, 16, [0.5, 0.5, 0.5]).unwrap();
        let w = Waveform::compute(&img);
        assert_eq!(w.columns, 32);
        for col in 0..32 {
            assert_eq!(w.at(col, 128), 16);
        }
        assert_eq!(w.data.iter().sum::<u32>(), 32 * 16);
    }

    #[test]
    fn horizontal_gradient_rises_across_columns() {
        let mut img = ImageBuffer::new(256, 4, 3).unwrap();
        for y in 0..4 {
            for x in 0..256 {
                let v = x as f32 / 255.0;
                img.set_pixel(x, y, [v, v, v]);
            }
        }
        let w = Waveform::compute(&img);
        // Column x holds all its pixels in luma row x.
        assert_eq!(w.at(0, 0), 4);
        assert_eq!(w.at(128, 128), 4);
        assert_eq!(w.at(255, 255), 4);
    }

    #[test]
    fn wide_images_fold_into_the_column_cap() {
        let img = ImageBuffer::splat(2048, 2, [0.0, 0.0, 0.0]).unwrap();
        let w = Waveform::compute(&img);
        assert_eq!(w.columns, Waveform::MAX_COLUMNS);
        assert_eq!(w.data.iter().sum::<u32>(), 2048 * 2);
    }
}
