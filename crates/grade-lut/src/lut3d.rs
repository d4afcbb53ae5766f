//! 3-dimensional lookup table.
//!
//! Samples are stored in **file order**: R varies fastest, then G,
//! then B - the same row-major order a `.cube` file lists them in, so
//! parse/serialize and the GPU flatten are straight copies and only
//! [`Lut3D::index`] knows the layout.

use crate::{LutError, LutResult};

/// A 3D lookup table with trilinear sampling.
///
/// Standard edge lengths are 17, 33 or 65. Inputs outside the domain
/// box are clamped before lookup, so output always comes from in-range
/// lattice data.
///
/// # Example
///
/// ```rust
/// use grade_lut::Lut3D;
///
/// let lut = Lut3D::identity(33);
/// let out = lut.apply([0.5, 0.3, 0.2]);
/// assert!((out[0] - 0.5).abs() < 1e-4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Lut3D {
    /// Display title carried from/to the `.cube` header.
    pub title: String,
    /// Cube edge length.
    pub size: usize,
    /// `size^3` RGB samples, R-fastest.
    pub data: Vec<[f32; 3]>,
    /// Input domain minimum per channel.
    pub domain_min: [f32; 3],
    /// Input domain maximum per channel.
    pub domain_max: [f32; 3],
}

impl Lut3D {
    /// Creates an identity (pass-through) LUT: the sample at lattice
    /// index (i, j, k) is (i, j, k) / (size - 1).
    pub fn identity(size: usize) -> Self {
        debug_assert!(size >= 2);
        let mut data = Vec::with_capacity(size * size * size);
        for b in 0..size {
            for g in 0..size {
                for r in 0..size {
                    data.push([
                        r as f32 / (size - 1) as f32,
                        g as f32 / (size - 1) as f32,
                        b as f32 / (size - 1) as f32,
                    ]);
                }
            }
        }
        Self {
            title: String::from("Identity"),
            size,
            data,
            domain_min: [0.0; 3],
            domain_max: [1.0; 3],
        }
    }

    /// Builds a LUT from R-fastest sample data.
    pub fn from_data(data: Vec<[f32; 3]>, size: usize) -> LutResult<Self> {
        let expected = size * size * size;
        if size < 2 {
            return Err(LutError::InvalidSize(format!("cube size {size} too small")));
        }
        if data.len() != expected {
            return Err(LutError::InvalidSize(format!(
                "expected {expected} entries for size {size}, got {}",
                data.len()
            )));
        }
        Ok(Self {
            title: String::new(),
            size,
            data,
            domain_min: [0.0; 3],
            domain_max: [1.0; 3],
        })
    }

    /// Sets the input domain box.
    pub fn with_domain(mut self, min: [f32; 3], max: [f32; 3]) -> Self {
        self.domain_min = min;
        self.domain_max = max;
        self
    }

    /// Sets the display title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Flattened `[r, g, b, r, g, b, ...]` sample stream in R-fastest
    /// order, the layout the GPU storage buffer expects.
    pub fn flattened(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.data.len() * 3);
        for rgb in &self.data {
            out.extend_from_slice(rgb);
        }
        out
    }

    /// Index of lattice point (r, g, b) in [`data`](Self::data).
    #[inline]
    pub fn index(&self, r: usize, g: usize, b: usize) -> usize {
        r + self.size * (g + self.size * b)
    }

    #[inline]
    fn get(&self, r: usize, g: usize, b: usize) -> [f32; 3] {
        self.data[self.index(r, g, b)]
    }

    /// Applies the LUT with trilinear interpolation over the 8
    /// neighboring lattice cells. Out-of-domain inputs are clamped to
    /// the domain box first.
    pub fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        let (r, g, b) = self.normalize(rgb);
        let n = (self.size - 1) as f32;

        let ri = ((r * n).floor() as usize).min(self.size - 2);
        let gi = ((g * n).floor() as usize).min(self.size - 2);
        let bi = ((b * n).floor() as usize).min(self.size - 2);

        let rf = r * n - ri as f32;
        let gf = g * n - gi as f32;
        let bf = b * n - bi as f32;

        let c000 = self.get(ri, gi, bi);
        let c100 = self.get(ri + 1, gi, bi);
        let c010 = self.get(ri, gi + 1, bi);
        let c110 = self.get(ri + 1, gi + 1, bi);
        let c001 = self.get(ri, gi, bi + 1);
        let c101 = self.get(ri + 1, gi, bi + 1);
        let c011 = self.get(ri, gi + 1, bi + 1);
        let c111 = self.get(ri + 1, gi + 1, bi + 1);

        let mut out = [0.0f32; 3];
        for i in 0..3 {
            let c00 = c000[i] * (1.0 - rf) + c100[i] * rf;
            let c10 = c010[i] * (1.0 - rf) + c110[i] * rf;
            let c01 = c001[i] * (1.0 - rf) + c101[i] * rf;
            let c11 = c011[i] * (1.0 - rf) + c111[i] * rf;

            let c0 = c00 * (1.0 - gf) + c10 * gf;
            let c1 = c01 * (1.0 - gf) + c11 * gf;

            out[i] = c0 * (1.0 - bf) + c1 * bf;
        }
        out
    }

    fn normalize(&self, rgb: [f32; 3]) -> (f32, f32, f32) {
        let norm = |v: f32, lo: f32, hi: f32| {
            let range = (hi - lo).max(1e-6);
            ((v - lo) / range).clamp(0.0, 1.0)
        };
        (
            norm(rgb[0], self.domain_min[0], self.domain_max[0]),
            norm(rgb[1], self.domain_min[1], self.domain_max[1]),
            norm(rgb[2], self.domain_min[2], self.domain_max[2]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn identity_passes_through() {
        let lut = Lut3D::identity(17);
        let out = lut.apply([0.5, 0.3, 0.8]);
        assert_abs_diff_eq!(out[0], 0.5, epsilon = 1e-4);
        assert_abs_diff_eq!(out[1], 0.3, epsilon = 1e-4);
        assert_abs_diff_eq!(out[2], 0.8, epsilon = 1e-4);
    }

    #[test]
    fn identity_is_exact_at_lattice_points() {
        let lut = Lut3D::identity(9);
        for k in 0..9 {
            let v = k as f32 / 8.0;
            let out = lut.apply([v, v, v]);
            assert_abs_diff_eq!(out[0], v, epsilon = 1e-6);
        }
    }

    #[test]
    fn corners_are_preserved() {
        let lut = Lut3D::identity(33);
        assert_abs_diff_eq!(lut.apply([0.0, 0.0, 0.0])[0], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(lut.apply([1.0, 1.0, 1.0])[2], 1.0, epsilon = 1e-6);
        let red = lut.apply([1.0, 0.0, 0.0]);
        assert_abs_diff_eq!(red[0], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(red[1], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn out_of_domain_inputs_clamp() {
        let lut = Lut3D::identity(17);
        let out = lut.apply([2.0, -1.0, 0.5]);
        assert_abs_diff_eq!(out[0], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(out[1], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn custom_domain_rescales_input() {
        let lut = Lut3D::identity(17).with_domain([0.0; 3], [2.0; 3]);
        // Input 1.0 sits at the middle of a 0..2 domain.
        let out = lut.apply([1.0, 1.0, 1.0]);
        assert_abs_diff_eq!(out[0], 0.5, epsilon = 1e-4);
    }

    #[test]
    fn from_data_rejects_wrong_length() {
        assert!(Lut3D::from_data(vec![[0.0; 3]; 7], 2).is_err());
        assert!(Lut3D::from_data(vec![[0.0; 3]; 8], 2).is_ok());
    }

    #[test]
    fn index_is_r_fastest() {
        let lut = Lut3D::identity(3);
        assert_eq!(lut.index(1, 0, 0), 1);
        assert_eq!(lut.index(0, 1, 0), 3);
        assert_eq!(lut.index(0, 0, 1), 9);
    }
}
