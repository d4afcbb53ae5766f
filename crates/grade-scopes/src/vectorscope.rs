//! Vectorscope: chroma distribution on the Cb/Cr plane.

use grade_core::ImageBuffer;
use rayon::prelude::*;

/// Chroma scatter histogram.
///
/// Each pixel's Rec.709 Cb/Cr chroma lands in a `SIZE x SIZE` grid
/// centered on neutral gray; saturated colors fall toward the edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vectorscope {
    /// Counts, row-major `[cr_bin * SIZE + cb_bin]`.
    pub data: Vec<u32>,
}

impl Vectorscope {
    /// Grid edge length.
    pub const SIZE: u32 = 256;

    /// Computes the vectorscope of an image.
    pub fn compute(image: &ImageBuffer) -> Self {
        let channels = image.channels() as usize;
        let row_len = image.width() as usize * channels;
        let cells = (Self::SIZE * Self::SIZE) as usize;

        let data = image
            .data()
            .par_chunks(row_len)
            .map(|row| {
                let mut acc = vec![0u32; cells];
                for px in row.chunks_exact(channels) {
                    let (cb, cr) = chroma(px[0], px[1], px[2]);
                    // cb/cr are in [-0.5, 0.5]; map to grid cells.
                    let x = ((cb + 0.5) * (Self::SIZE - 1) as f32 + 0.5) as u32;
                    let y = ((cr + 0.5) * (Self::SIZE - 1) as f32 + 0.5) as u32;
                    acc[(y.min(Self::SIZE - 1) * Self::SIZE + x.min(Self::SIZE - 1)) as usize] += 1;
                }
                acc
            })
            .reduce(
                || vec![0u32; cells],
                |mut a, b| {
                    for (x, y) in a.iter_mut().zip(&b) {
                        *x += y;
                    }
                    a
                },
            );

        Self { data }
    }

    /// Count at grid cell (cb, cr).
    pub fn at(&self, cb: u32, cr: u32) -> u32 {
        self.data[(cr * Self::SIZE + cb) as usize]
    }

    /// Center cell index, where neutral colors accumulate.
    pub fn center() -> u32 {
        Self::SIZE / 2
    }
}

/// Rec.709 Cb/Cr from linear RGB, each in [-0.5, 0.5] for RGB in [0,1].
#[inline]
fn chroma(r: f32, g: f32, b: f32) -> (f32, f32) {
    let y = 0.2126 * r + 0.7152 * g + 0.0722 * b;
    let cb = (b - y) / 1.8556;
    let cr = (r - y) / 1.5748;
    (cb.clamp(-0.5, 0.5), cr.clamp(-0.5, 0.5))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_image_lands_at_the_center() {
        let img = ImageBuffer::splat(8, 8, [0.5, 0.5, 0.5]).unwrap();
        let v = Vectorscope::compute(&img);
        let c = Vectorscope::center();
        assert_eq!(v.at(c, c), 64);
        assert_eq!(v.data.iter().sum::<u32>(), 64);
    }

    #[test]
    fn pure_red_lands_high_on_cr() {
        let img = ImageBuffer::splat(4, 4, [1.0, 0.0, 0.0]).unwrap();
        let v = Vectorscope::compute(&img);
        let c = Vectorscope::center();

        let mut hot = None;
        for cr in 0..Vectorscope::SIZE {
            for cb in 0..Vectorscope::SIZE {
                if v.at(cb, cr) > 0 {
                    hot = Some((cb, cr));
                }
            }
        }
        let (cb, cr) = hot.unwrap();
        assert!(cr > c, "red should sit above center on the Cr axis");
        assert!(cb < c, "red pulls Cb negative");
    }

    #[test]
    fn counts_sum_to_pixel_count() {
        let mut img = ImageBuffer::new(16, 16, 3).unwrap();
        for y in 0..16 {
            for x in 0..16 {
                img.set_pixel(x, y, [x as f32 / 15.0, y as f32 / 15.0, 0.3]);
            }
        }
        let v = Vectorscope::compute(&img);
        assert_eq!(v.data.iter().sum::<u32>(), 256);
    }
}
