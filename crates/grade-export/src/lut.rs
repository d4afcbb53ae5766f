//! Baked `.cube` delivery.

use std::path::Path;

use grade_core::AdjustmentState;
use grade_lut::Lut3D;
use grade_ops::bake;
use tracing::info;

use crate::ExportResult;

/// Bakes the global color chain (optionally composed with the active
/// LUT) and writes it as a `.cube` file.
pub fn export_lut_file<P: AsRef<Path>>(
    path: P,
    adjustments: &AdjustmentState,
    size: usize,
    base: Option<&Lut3D>,
    title: &str,
) -> ExportResult<()> {
    bake::export_cube(path.as_ref(), adjustments, size, base, title)?;
    info!(path = %path.as_ref().display(), size, "LUT exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use grade_ops::chain::grade_color;

    #[test]
    fn exported_cube_reloads_and_matches_the_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("look.cube");

        let mut adj = AdjustmentState::default();
        adj.contrast = 40.0;
        adj.saturation = 20.0;

        export_lut_file(&path, &adj, 17, None, "Contrast Pop").unwrap();

        let lut = grade_lut::cube::read(&path).unwrap();
        assert_eq!(lut.size, 17);
        // Probe a lattice point: 0.5 = 8/16.
        let direct = grade_color([0.5, 0.5, 0.5], &adj);
        let via = lut.apply([0.5, 0.5, 0.5]);
        assert_abs_diff_eq!(via[0], direct[0].clamp(0.0, 1.0), epsilon = 1e-5);
        assert_abs_diff_eq!(via[1], direct[1].clamp(0.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn neutral_state_exports_the_identity_lut() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.cube");

        export_lut_file(&path, &AdjustmentState::default(), 9, None, "Identity").unwrap();

        let lut = grade_lut::cube::read(&path).unwrap();
        let n = (lut.size - 1) as f32;
        for b in 0..lut.size {
            for g in 0..lut.size {
                for r in 0..lut.size {
                    let expected = [r as f32 / n, g as f32 / n, b as f32 / n];
                    let got = lut.data[lut.index(r, g, b)];
                    for ch in 0..3 {
                        assert_abs_diff_eq!(got[ch], expected[ch], epsilon = 1e-5);
                    }
                }
            }
        }
    }
}
