//! Bakes the current grade into a 3D LUT.
//!
//! The bake probes the color-only chain at every lattice point, so the
//! exported `.cube` reproduces the grade in any LUT-capable
//! application. Spatial effects (masks, halation, grain, vignette,
//! sharpness) cannot be expressed as a per-color mapping and are
//! excluded by construction.

use std::path::Path;

use grade_core::AdjustmentState;
use grade_lut::{cube, Lut3D, LutResult};
use rayon::prelude::*;

use crate::chain::grade_color;

/// Default lattice edge for exported LUTs.
pub const DEFAULT_BAKE_SIZE: usize = 33;

/// Bakes `adj`'s color chain into a LUT of the given edge size.
///
/// When `base` is the session's active LUT, it is composed into the
/// bake after the chain, weighted by `adj.lut_intensity`, matching
/// exactly what [`GradeStack::evaluate`](crate::GradeStack::evaluate)
/// computes per pixel.
pub fn bake_lut(adj: &AdjustmentState, size: usize, base: Option<&Lut3D>) -> Lut3D {
    debug_assert!(size >= 2);
    let n = (size - 1) as f32;
    let intensity = adj.lut_intensity.clamp(0.0, 1.0);

    // Lattice points in R-fastest file order, rows parallel over B.
    let data: Vec<[f32; 3]> = (0..size * size * size)
        .into_par_iter()
        .map(|idx| {
            let r = (idx % size) as f32 / n;
            let g = ((idx / size) % size) as f32 / n;
            let b = (idx / (size * size)) as f32 / n;

            let mut out = grade_color([r, g, b], adj);
            if let Some(base) = base {
                if intensity > 0.0 {
                    let clamped = [
                        out[0].clamp(0.0, 1.0),
                        out[1].clamp(0.0, 1.0),
                        out[2].clamp(0.0, 1.0),
                    ];
                    let looked = base.apply(clamped);
                    for i in 0..3 {
                        out[i] += (looked[i] - out[i]) * intensity;
                    }
                }
            }
            [
                out[0].clamp(0.0, 1.0),
                out[1].clamp(0.0, 1.0),
                out[2].clamp(0.0, 1.0),
            ]
        })
        .collect();

    Lut3D {
        title: String::new(),
        size,
        data,
        domain_min: [0.0; 3],
        domain_max: [1.0; 3],
    }
}

/// Bakes and writes a `.cube` file in one step.
pub fn export_cube<P: AsRef<Path>>(
    path: P,
    adj: &AdjustmentState,
    size: usize,
    base: Option<&Lut3D>,
    title: &str,
) -> LutResult<()> {
    let lut = bake_lut(adj, size, base).with_title(title);
    cube::write(path, &lut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn neutral_bake_is_identity() {
        let lut = bake_lut(&AdjustmentState::default(), 17, None);
        let identity = Lut3D::identity(17);
        for (a, b) in lut.data.iter().zip(&identity.data) {
            assert_abs_diff_eq!(a[0], b[0], epsilon = 1e-6);
            assert_abs_diff_eq!(a[1], b[1], epsilon = 1e-6);
            assert_abs_diff_eq!(a[2], b[2], epsilon = 1e-6);
        }
    }

    #[test]
    fn baked_lut_reproduces_the_chain_at_lattice_points() {
        let mut adj = AdjustmentState::default();
        adj.exposure = 0.5;
        adj.contrast = 30.0;
        adj.saturation = -20.0;

        let lut = bake_lut(&adj, 33, None);
        for probe in [[0.0, 0.5, 1.0], [0.25, 0.25, 0.25], [1.0, 0.0, 0.5]] {
            let direct = grade_color(probe, &adj);
            let direct = [
                direct[0].clamp(0.0, 1.0),
                direct[1].clamp(0.0, 1.0),
                direct[2].clamp(0.0, 1.0),
            ];
            let via_lut = lut.apply(probe);
            // Lattice-exact probes (multiples of 1/32 land on lattice
            // points for the 0/0.25/0.5/1.0 values used here).
            assert_abs_diff_eq!(via_lut[0], direct[0], epsilon = 1e-5);
            assert_abs_diff_eq!(via_lut[1], direct[1], epsilon = 1e-5);
            assert_abs_diff_eq!(via_lut[2], direct[2], epsilon = 1e-5);
        }
    }

    #[test]
    fn bake_composes_base_lut_by_intensity() {
        // Base LUT maps everything to mid-gray; half intensity means
        // the bake lands halfway between chain output and gray.
        let size = 2;
        let gray = Lut3D::from_data(vec![[0.5, 0.5, 0.5]; 8], size).unwrap();

        let mut adj = AdjustmentState::default();
        adj.lut_intensity = 0.5;

        let lut = bake_lut(&adj, 9, Some(&gray));
        let black = lut.apply([0.0, 0.0, 0.0]);
        assert_abs_diff_eq!(black[0], 0.25, epsilon = 1e-5);
        let white = lut.apply([1.0, 1.0, 1.0]);
        assert_abs_diff_eq!(white[0], 0.75, epsilon = 1e-5);
    }

    #[test]
    fn export_round_trip_within_1e5() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grade.cube");

        let mut adj = AdjustmentState::default();
        adj.exposure = 0.3;
        adj.temperature = 25.0;
        adj.fade = 40.0;

        export_cube(&path, &adj, 33, None, "Baked Grade").unwrap();
        let loaded = cube::read(&path).unwrap();
        assert_eq!(loaded.title, "Baked Grade");

        let baked = bake_lut(&adj, 33, None);
        for (a, b) in baked.data.iter().zip(&loaded.data) {
            assert_abs_diff_eq!(a[0], b[0], epsilon = 1e-5);
            assert_abs_diff_eq!(a[1], b[1], epsilon = 1e-5);
            assert_abs_diff_eq!(a[2], b[2], epsilon = 1e-5);
        }
    }
}
