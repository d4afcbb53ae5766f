//! Plain-old-data structs mirroring the WGSL uniform and storage
//! layouts in [`shaders`](crate::shaders).
//!
//! Every field group is padded to 16 bytes so the Rust layout matches
//! WGSL std140-style uniform rules exactly. Layout tests below pin the
//! sizes; change the WGSL and these structs together or the pipeline
//! reads garbage.

use bytemuck::{Pod, Zeroable};
use grade_core::{AdjustmentState, Mask, MaskShape};

/// Maximum number of masks the grade kernel evaluates per pixel.
/// Masks past this count are ignored by the GPU path; the CPU
/// reference applies the same cap so the two stay comparable.
pub const MAX_MASKS: usize = 8;

/// Color-chain parameters for one adjustment state, packed as 16 f32.
///
/// Matches `struct GradeParams` in the WGSL source field for field.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GradeParams {
    /// Exposure in stops.
    pub exposure: f32,
    /// Temperature, -100..100.
    pub temperature: f32,
    /// Tint, -100..100.
    pub tint: f32,
    /// Contrast, -100..100.
    pub contrast: f32,
    /// Saturation, -100..100.
    pub saturation: f32,
    /// Vibrance, -100..100.
    pub vibrance: f32,
    /// Shadows lift, -100..100.
    pub shadows: f32,
    /// Highlights lift, -100..100.
    pub highlights: f32,
    /// Whites, -100..100.
    pub whites: f32,
    /// Blacks, -100..100.
    pub blacks: f32,
    /// Clarity, -100..100.
    pub clarity: f32,
    /// Dehaze, -100..100.
    pub dehaze: f32,
    /// Fade, 0..100.
    pub fade: f32,
    /// LUT blend weight, 0..1. Zero when no LUT is bound.
    pub lut_intensity: f32,
    /// Unused, keeps the struct a whole number of vec4s.
    pub _pad: [f32; 2],
}

impl GradeParams {
    /// Packs an [`AdjustmentState`]'s color-chain fields. Spatial
    /// fields (grain, vignette, halation, sharpness) travel in
    /// [`GlobalUniforms`] instead.
    pub fn from_state(adj: &AdjustmentState, lut_bound: bool) -> Self {
        Self {
            exposure: adj.exposure,
            temperature: adj.temperature,
            tint: adj.tint,
            contrast: adj.contrast,
            saturation: adj.saturation,
            vibrance: adj.vibrance,
            shadows: adj.shadows,
            highlights: adj.highlights,
            whites: adj.whites,
            blacks: adj.blacks,
            clarity: adj.clarity,
            dehaze: adj.dehaze,
            fade: adj.fade,
            lut_intensity: if lut_bound {
                adj.lut_intensity.clamp(0.0, 1.0)
            } else {
                0.0
            },
            _pad: [0.0; 2],
        }
    }
}

/// One mask entry in the GPU mask array.
///
/// Matches `struct MaskUniform` in the WGSL source. `kind` selects the
/// geometric coverage function: 0 disabled slot, 1 radial, 2 linear.
/// A non-zero `raster_size` means the mask carries a painted raster;
/// the kernel then samples the shared raster buffer at `raster_offset`
/// instead of evaluating the geometry, the same precedence
/// `Mask::coverage` applies on the CPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MaskUniform {
    /// 0 = empty slot, 1 = radial, 2 = linear.
    pub kind: u32,
    /// 1 to invert coverage.
    pub invert: u32,
    /// Feather fraction, 0..1.
    pub feather: f32,
    /// Start of this mask's texels in the shared raster buffer.
    pub raster_offset: u32,
    /// Radial: center UV. Linear: gradient start UV.
    pub point_a: [f32; 2],
    /// Radial: radius-defining UV point. Linear: gradient end UV.
    pub point_b: [f32; 2],
    /// Painted raster dimensions; `[0, 0]` when purely geometric.
    pub raster_size: [u32; 2],
    /// Unused, keeps the struct a whole number of vec4s.
    pub _pad0: [u32; 2],
    /// The mask's local adjustment chain.
    pub grade: GradeParams,
}

impl MaskUniform {
    /// An empty slot the kernel skips.
    pub fn empty() -> Self {
        Self::zeroed()
    }

    /// Packs an enabled mask. Disabled masks should not be packed;
    /// pass them through [`pack_masks`], which filters first and
    /// assigns raster offsets.
    pub fn from_mask(mask: &Mask) -> Self {
        let (kind, point_a, point_b) = match mask.shape {
            MaskShape::Radial { center, radius_point } => (1u32, center, radius_point),
            MaskShape::Linear { start, end } => (2u32, start, end),
        };
        let raster_size = mask
            .raster
            .as_ref()
            .map(|r| [r.width(), r.height()])
            .unwrap_or([0, 0]);
        Self {
            kind,
            invert: mask.invert as u32,
            feather: mask.feather,
            raster_offset: 0,
            point_a,
            point_b,
            raster_size,
            _pad0: [0; 2],
            grade: GradeParams::from_state(&mask.adjustments, false),
        }
    }
}

/// Packs a session's enabled masks into the fixed-size GPU array,
/// preserving list order and capping at [`MAX_MASKS`]. Painted raster
/// texels are concatenated into one shared buffer; each entry's
/// `raster_offset` points at its own run. Returns the array, the live
/// count and the raster buffer (empty when no mask is painted).
pub fn pack_masks(masks: &[Mask]) -> ([MaskUniform; MAX_MASKS], u32, Vec<f32>) {
    let mut out = [MaskUniform::empty(); MAX_MASKS];
    let mut rasters = Vec::new();
    let mut n = 0usize;
    for mask in masks.iter().filter(|m| m.enabled) {
        if n == MAX_MASKS {
            break;
        }
        let mut packed = MaskUniform::from_mask(mask);
        if let Some(raster) = &mask.raster {
            packed.raster_offset = rasters.len() as u32;
            rasters.extend_from_slice(raster.data());
        }
        out[n] = packed;
        n += 1;
    }
    (out, n as u32, rasters)
}

/// Top-level uniform block for the grade and composite kernels.
///
/// Matches `struct Globals` in the WGSL source.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GlobalUniforms {
    /// x = width, y = height, z = mask count, w = LUT edge size
    /// (0 when no LUT is bound).
    pub dims: [u32; 4],
    /// Global color chain.
    pub grade: GradeParams,
    /// x = grain amount, y = grain size, z = vignette amount,
    /// w = vignette midpoint.
    pub effects: [f32; 4],
    /// x = halation amount, y = grain seed, z = aspect (w/h),
    /// w = sharpness.
    pub misc: [f32; 4],
}

impl GlobalUniforms {
    /// Assembles the uniform block for one render.
    pub fn new(
        width: u32,
        height: u32,
        adj: &AdjustmentState,
        mask_count: u32,
        lut_size: u32,
        grain_seed: f32,
    ) -> Self {
        Self {
            dims: [width, height, mask_count, lut_size],
            grade: GradeParams::from_state(adj, lut_size > 0),
            effects: [
                adj.grain_amount,
                adj.grain_size,
                adj.vignette_amount,
                adj.vignette_midpoint,
            ],
            misc: [
                adj.halation,
                grain_seed,
                width as f32 / height.max(1) as f32,
                adj.sharpness,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grade_core::{MaskId, RasterMask};

    #[test]
    fn struct_sizes_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<GradeParams>(), 64);
        assert_eq!(std::mem::size_of::<MaskUniform>(), 112);
        assert_eq!(std::mem::size_of::<GlobalUniforms>(), 112);
    }

    #[test]
    fn pack_masks_skips_disabled_and_preserves_order() {
        let mut a = Mask::radial(MaskId(1));
        a.adjustments.exposure = 1.0;
        let mut b = Mask::linear(MaskId(2));
        b.enabled = false;
        let mut c = Mask::linear(MaskId(3));
        c.adjustments.exposure = -1.0;

        let (packed, n, _) = pack_masks(&[a, b, c]);
        assert_eq!(n, 2);
        assert_eq!(packed[0].kind, 1);
        assert_eq!(packed[1].kind, 2);
        assert_eq!(packed[0].grade.exposure, 1.0);
        assert_eq!(packed[1].grade.exposure, -1.0);
        assert_eq!(packed[2].kind, 0);
    }

    #[test]
    fn pack_masks_caps_at_max() {
        let masks: Vec<Mask> = (0..12).map(|i| Mask::radial(MaskId(i))).collect();
        let (_, n, _) = pack_masks(&masks);
        assert_eq!(n, MAX_MASKS as u32);
    }

    #[test]
    fn painted_raster_texels_travel_with_the_mask() {
        let mut mask = Mask::radial(MaskId(1));
        let mut raster = RasterMask::new(32, 32).unwrap();
        raster.apply_brush([0.9, 0.9], 0.1, 0.5, 1.0);
        mask.raster = Some(raster);

        let (packed, n, texels) = pack_masks(&[mask.clone()]);
        assert_eq!(n, 1);
        assert_eq!(packed[0].raster_size, [32, 32]);
        assert_eq!(texels.len(), 32 * 32);

        // The kernel samples these texels, not the radial falloff: the
        // raster is unpainted at the image center where the geometry
        // alone would give full coverage.
        let center = texels[packed[0].raster_offset as usize + 16 * 32 + 16];
        assert!(center < 0.05, "center texel {center}");
        assert!(mask.coverage(0.5, 0.5) < 0.05);
        let dab = texels[packed[0].raster_offset as usize + 29 * 32 + 29];
        assert!(dab > 0.5, "dab texel {dab}");
    }

    #[test]
    fn raster_offsets_index_the_shared_buffer() {
        let mut first = Mask::radial(MaskId(1));
        first.raster = Some(RasterMask::new(8, 4).unwrap());
        let geometric = Mask::linear(MaskId(2));
        let mut second = Mask::radial(MaskId(3));
        second.raster = Some(RasterMask::new(4, 4).unwrap());

        let (packed, n, texels) = pack_masks(&[first, geometric, second]);
        assert_eq!(n, 3);
        assert_eq!(texels.len(), 8 * 4 + 4 * 4);
        assert_eq!(packed[0].raster_offset, 0);
        assert_eq!(packed[1].raster_size, [0, 0]);
        assert_eq!(packed[2].raster_offset, 32);
    }

    #[test]
    fn lut_intensity_zeroed_without_lut() {
        let mut adj = AdjustmentState::default();
        adj.lut_intensity = 0.8;
        assert_eq!(GradeParams::from_state(&adj, false).lut_intensity, 0.0);
        assert_eq!(GradeParams::from_state(&adj, true).lut_intensity, 0.8);
    }

    #[test]
    fn globals_carry_dims_and_aspect() {
        let adj = AdjustmentState::default();
        let g = GlobalUniforms::new(1920, 1080, &adj, 3, 33, 0.5);
        assert_eq!(g.dims, [1920, 1080, 3, 33]);
        assert!((g.misc[2] - 1920.0 / 1080.0).abs() < 1e-6);
    }
}
