//! The fixed-order per-pixel color chain.
//!
//! Every step is identity at its neutral parameter value, so a neutral
//! [`AdjustmentState`] is a provable no-op. All math runs in
//! normalized [0,1] space; only the end of the full evaluation clamps.
//!
//! The film presets are authored against these exact constants:
//! temperature/tint shift 0.1 per unit, tonal lifts scale 0.2, fade
//! pulls toward 0.1 gray with a 0.3 ceiling.

use grade_core::{AdjustmentState, Mask};
use grade_lut::Lut3D;

/// Rec.709 luma weights.
pub const LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Luminance of an RGB triple (Rec.709).
#[inline]
pub fn luminance(rgb: [f32; 3]) -> f32 {
    rgb[0] * LUMA[0] + rgb[1] * LUMA[1] + rgb[2] * LUMA[2]
}

#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Applies the color-only chain (no masks, no LUT, no spatial effects)
/// to one RGB value. This is the function LUT baking probes.
pub fn grade_color(rgb: [f32; 3], adj: &AdjustmentState) -> [f32; 3] {
    let mut c = rgb;

    // 1. Exposure: linear gain in stops.
    if adj.exposure != 0.0 {
        let gain = 2.0f32.powf(adj.exposure);
        c = [c[0] * gain, c[1] * gain, c[2] * gain];
    }

    // 2. Temperature / tint: additive channel shifts.
    if adj.temperature != 0.0 {
        let t = adj.temperature / 100.0;
        c[0] += t * 0.1;
        c[2] -= t * 0.1;
    }
    if adj.tint != 0.0 {
        // Positive tint shifts toward magenta, negative toward green.
        let t = adj.tint / 100.0;
        c[1] -= t * 0.1;
        c[0] += t * 0.05;
        c[2] += t * 0.05;
    }

    // 3. Contrast: pivot around mid-gray.
    if adj.contrast != 0.0 {
        let k = 1.0 + adj.contrast / 100.0;
        c = [
            (c[0] - 0.5) * k + 0.5,
            (c[1] - 0.5) * k + 0.5,
            (c[2] - 0.5) * k + 0.5,
        ];
    }

    // 4. Saturation: blend toward luminance.
    if adj.saturation != 0.0 {
        let k = 1.0 + adj.saturation / 100.0;
        let l = luminance(c);
        c = [l + (c[0] - l) * k, l + (c[1] - l) * k, l + (c[2] - l) * k];
    }

    // 5. Vibrance: same blend, weighted down for already-saturated pixels.
    if adj.vibrance != 0.0 {
        let v = adj.vibrance / 100.0;
        let max_c = c[0].max(c[1]).max(c[2]);
        let min_c = c[0].min(c[1]).min(c[2]);
        let sat_level = (max_c - min_c) / (max_c + 0.001);
        let k = 1.0 + v * (1.0 - sat_level);
        let l = luminance(c);
        c = [l + (c[0] - l) * k, l + (c[1] - l) * k, l + (c[2] - l) * k];
    }

    // 6. Shadows / highlights: luminance-masked additive lifts.
    if adj.shadows != 0.0 || adj.highlights != 0.0 {
        let l = luminance(c);
        let shadow_mask = 1.0 - (2.0 * l).min(1.0);
        let highlight_mask = (2.0 * l - 1.0).max(0.0);
        let s = adj.shadows / 100.0 * 0.2 * shadow_mask;
        let h = adj.highlights / 100.0 * 0.2 * highlight_mask;
        c = [c[0] + s + h, c[1] + s + h, c[2] + s + h];
    }

    // 7. Whites / blacks: narrower masks at the extremes.
    if adj.whites != 0.0 || adj.blacks != 0.0 {
        let l = luminance(c);
        let white_mask = smoothstep(0.75, 1.0, l);
        let black_mask = 1.0 - smoothstep(0.0, 0.25, l);
        let w = adj.whites / 100.0 * white_mask;
        let b = adj.blacks / 100.0 * black_mask;
        c = [
            c[0] + c[0] * w + b * 0.2,
            c[1] + c[1] * w + b * 0.2,
            c[2] + c[2] * w + b * 0.2,
        ];
    }

    // 8. Clarity: midtone contrast with a bell mask around 0.5.
    if adj.clarity != 0.0 {
        let l = luminance(c);
        let mask = {
            let m = 1.0 - (l - 0.5).abs() * 2.0;
            (m * m).max(0.0)
        };
        let k = 1.0 + adj.clarity / 100.0 * mask * 0.5;
        c = [
            (c[0] - 0.5) * k + 0.5,
            (c[1] - 0.5) * k + 0.5,
            (c[2] - 0.5) * k + 0.5,
        ];
    }

    // 9. Dehaze: dark-channel transmission estimate.
    if adj.dehaze != 0.0 {
        let d = adj.dehaze / 100.0;
        let haze = c[0].min(c[1]).min(c[2]).clamp(0.0, 1.0);
        let transmission = (1.0 - d * haze).max(0.1);
        let blend = d.abs();
        for ch in &mut c {
            let recovered = ((*ch - (1.0 - transmission)) / transmission).clamp(0.0, 1.0);
            *ch += (recovered - *ch) * blend;
        }
    }

    // 10. Fade: lift toward light gray.
    if adj.fade != 0.0 {
        let f = adj.fade / 100.0;
        c = [
            c[0] * (1.0 - f * 0.3) + f * 0.1,
            c[1] * (1.0 - f * 0.3) + f * 0.1,
            c[2] * (1.0 - f * 0.3) + f * 0.1,
        ];
    }

    c
}

/// One resolved grade: global state, enabled masks in compositing
/// order, optional LUT. Borrowed views only - building a stack never
/// copies pixel data, and the render pipeline stays a pure function of
/// session state.
pub struct GradeStack<'a> {
    /// Global adjustments.
    pub global: &'a AdjustmentState,
    /// Masks in list order (later masks composite on top).
    pub masks: &'a [Mask],
    /// Selected LUT, if any.
    pub lut: Option<&'a Lut3D>,
    /// Width/height ratio for mask aspect correction.
    pub aspect: f32,
}

impl<'a> GradeStack<'a> {
    /// Evaluates the full per-pixel color transform (chain + masks +
    /// LUT blend) at UV coordinate (u, v). Spatial effects are applied
    /// afterwards by the renderer. Output is clamped to [0,1].
    pub fn evaluate(&self, rgb: [f32; 3], u: f32, v: f32) -> [f32; 3] {
        let mut out = grade_color(rgb, self.global);

        // Local masks: recompute the chain from the source pixel with
        // each mask's own state, alpha-composited in list order. Same
        // enabled filter and cap as the GPU mask array.
        for mask in self
            .masks
            .iter()
            .filter(|m| m.enabled)
            .take(crate::uniforms::MAX_MASKS)
        {
            let coverage = mask.coverage_aspect(u, v, self.aspect);
            if coverage <= 0.0 {
                continue;
            }
            let local = grade_color(rgb, &mask.adjustments);
            for i in 0..3 {
                out[i] += (local[i] - out[i]) * coverage;
            }
        }

        // LUT blend at the end of the color chain.
        if let Some(lut) = self.lut {
            let intensity = self.global.lut_intensity.clamp(0.0, 1.0);
            if intensity > 0.0 {
                let looked = lut.apply([
                    out[0].clamp(0.0, 1.0),
                    out[1].clamp(0.0, 1.0),
                    out[2].clamp(0.0, 1.0),
                ]);
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
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use grade_core::MaskId;

    #[test]
    fn neutral_state_is_identity() {
        let adj = AdjustmentState::default();
        for rgb in [[0.0, 0.0, 0.0], [0.25, 0.5, 0.75], [1.0, 1.0, 1.0]] {
            let out = grade_color(rgb, &adj);
            assert_abs_diff_eq!(out[0], rgb[0], epsilon = 1e-7);
            assert_abs_diff_eq!(out[1], rgb[1], epsilon = 1e-7);
            assert_abs_diff_eq!(out[2], rgb[2], epsilon = 1e-7);
        }
    }

    #[test]
    fn exposure_doubles_linear_rgb() {
        let mut adj = AdjustmentState::default();
        adj.exposure = 1.0;
        let out = grade_color([0.25, 0.1, 0.4], &adj);
        assert_abs_diff_eq!(out[0], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(out[1], 0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(out[2], 0.8, epsilon = 1e-6);
    }

    #[test]
    fn chain_order_is_not_commutative() {
        // Exposure then contrast must differ from contrast then exposure
        // on a non-mid-gray input.
        let mut exposure_only = AdjustmentState::default();
        exposure_only.exposure = 1.0;
        let mut contrast_only = AdjustmentState::default();
        contrast_only.contrast = 50.0;

        let rgb = [0.3, 0.3, 0.3];
        let a = grade_color(grade_color(rgb, &exposure_only), &contrast_only);
        let b = grade_color(grade_color(rgb, &contrast_only), &exposure_only);
        assert!((a[0] - b[0]).abs() > 1e-3, "expected order sensitivity, got {a:?} vs {b:?}");
    }

    #[test]
    fn combined_state_applies_exposure_before_contrast() {
        // The single-state chain must equal the split two-state chain
        // in the documented order.
        let mut combined = AdjustmentState::default();
        combined.exposure = 1.0;
        combined.contrast = 50.0;

        let mut exposure_only = AdjustmentState::default();
        exposure_only.exposure = 1.0;
        let mut contrast_only = AdjustmentState::default();
        contrast_only.contrast = 50.0;

        let rgb = [0.3, 0.2, 0.6];
        let chained = grade_color(rgb, &combined);
        let split = grade_color(grade_color(rgb, &exposure_only), &contrast_only);
        for i in 0..3 {
            assert_abs_diff_eq!(chained[i], split[i], epsilon = 1e-6);
        }
    }

    #[test]
    fn vibrance_spares_saturated_pixels() {
        let mut adj = AdjustmentState::default();
        adj.vibrance = 80.0;

        let muted = [0.5, 0.45, 0.48];
        let saturated = [0.9, 0.1, 0.1];

        let muted_shift = {
            let out = grade_color(muted, &adj);
            (out[0] - muted[0]).abs() + (out[1] - muted[1]).abs() + (out[2] - muted[2]).abs()
        };
        let saturated_shift = {
            let out = grade_color(saturated, &adj);
            (out[0] - saturated[0]).abs()
                + (out[1] - saturated[1]).abs()
                + (out[2] - saturated[2]).abs()
        };
        // Relative to the pixel's own chroma, the muted pixel moves more.
        let muted_chroma = 0.05f32;
        let saturated_chroma = 0.8f32;
        assert!(muted_shift / muted_chroma > saturated_shift / saturated_chroma);
    }

    #[test]
    fn shadows_lift_darks_not_brights() {
        let mut adj = AdjustmentState::default();
        adj.shadows = 100.0;
        let dark = grade_color([0.1, 0.1, 0.1], &adj);
        let bright = grade_color([0.9, 0.9, 0.9], &adj);
        assert!(dark[0] > 0.1 + 0.05);
        assert_abs_diff_eq!(bright[0], 0.9, epsilon = 1e-6);
    }

    #[test]
    fn masked_grade_composites_by_coverage() {
        let global = AdjustmentState::default();
        let mut mask = Mask::radial(MaskId(1));
        mask.adjustments.exposure = 1.0;
        let masks = vec![mask];

        let stack = GradeStack { global: &global, masks: &masks, lut: None, aspect: 1.0 };

        // Center of the mask: full local exposure.
        let center = stack.evaluate([0.25, 0.25, 0.25], 0.5, 0.5);
        assert_abs_diff_eq!(center[0], 0.5, epsilon = 1e-4);

        // Far corner: untouched global result.
        let corner = stack.evaluate([0.25, 0.25, 0.25], 0.02, 0.02);
        assert_abs_diff_eq!(corner[0], 0.25, epsilon = 1e-4);
    }

    #[test]
    fn later_masks_composite_on_top() {
        let global = AdjustmentState::default();
        let mut under = Mask::radial(MaskId(1));
        under.feather = 0.0;
        under.adjustments.exposure = 2.0;
        let mut over = Mask::radial(MaskId(2));
        over.feather = 0.0;
        over.adjustments.exposure = -2.0;
        let masks = vec![under, over];

        let stack = GradeStack { global: &global, masks: &masks, lut: None, aspect: 1.0 };
        // Both masks fully cover the center; the later one wins outright
        // because coverage is 1.
        let out = stack.evaluate([0.2, 0.2, 0.2], 0.5, 0.5);
        assert_abs_diff_eq!(out[0], 0.05, epsilon = 1e-4);
    }

    #[test]
    fn identity_lut_at_zero_intensity_is_no_op() {
        let mut global = AdjustmentState::default();
        global.lut_intensity = 0.0;
        let lut = Lut3D::identity(17);
        let stack = GradeStack { global: &global, masks: &[], lut: Some(&lut), aspect: 1.0 };
        let out = stack.evaluate([0.3, 0.6, 0.9], 0.5, 0.5);
        assert_abs_diff_eq!(out[0], 0.3, epsilon = 1e-6);
        assert_abs_diff_eq!(out[2], 0.9, epsilon = 1e-6);
    }

    #[test]
    fn lut_blend_respects_intensity() {
        let mut global = AdjustmentState::default();
        global.lut_intensity = 0.5;
        // A LUT that maps everything to white.
        let size = 2;
        let lut = Lut3D::from_data(vec![[1.0, 1.0, 1.0]; size * size * size], size).unwrap();
        let stack = GradeStack { global: &global, masks: &[], lut: Some(&lut), aspect: 1.0 };
        let out = stack.evaluate([0.0, 0.0, 0.0], 0.5, 0.5);
        assert_abs_diff_eq!(out[0], 0.5, epsilon = 1e-6);
    }
}
