//! Local-adjustment masks.
//!
//! # Overview
//!
//! A [`Mask`] pairs a geometric descriptor (radial or linear, in
//! normalized 0..1 UV space) with its own [`AdjustmentState`] override
//! and an optional painted raster. The per-pixel [`coverage`] scalar in
//! [0,1] weights the mask's grade when it is composited over the global
//! result.
//!
//! # Coverage contract
//!
//! - continuous everywhere for feather > 0; hard 0/1 edge only at
//!   feather = 0
//! - radial: 1 at center, 0 at and beyond `radius * (1 + feather)`
//! - linear: 1 on the start side of the band, feathered transition
//!   across the start->end axis
//! - `invert` flips coverage; painted rasters bypass geometric falloff
//!   and are sampled directly
//!
//! [`coverage`]: Mask::coverage

use serde::{Deserialize, Serialize};

use crate::{AdjustmentState, Error, Result};

/// Stable mask identifier, unique within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaskId(pub u64);

/// Geometric descriptor of a mask, in normalized UV coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MaskShape {
    /// Elliptical falloff: full strength at `center`, zero at the
    /// distance of `radius_point` (times 1 + feather).
    Radial {
        /// Center of the ellipse.
        center: [f32; 2],
        /// A point on the nominal radius; drag handle in the UI.
        radius_point: [f32; 2],
    },
    /// Gradient band along the `start -> end` axis: full strength
    /// behind `start`, feathered falloff approaching `end`.
    Linear {
        /// Full-coverage side of the band.
        start: [f32; 2],
        /// Zero-coverage side of the band.
        end: [f32; 2],
    },
}

/// One local-adjustment mask owned by an [`crate::ImageSession`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    /// Session-stable identifier.
    pub id: MaskId,
    /// Geometry; ignored while a painted raster is present.
    pub shape: MaskShape,
    /// Disabled masks contribute zero coverage.
    pub enabled: bool,
    /// Flips coverage (1 - c).
    pub invert: bool,
    /// Edge softness, 0..1. Zero produces a hard edge.
    pub feather: f32,
    /// This mask's own adjustment override.
    pub adjustments: AdjustmentState,
    /// Painted grayscale coverage, replacing the geometric falloff.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub raster: Option<RasterMask>,
}

impl Mask {
    /// A radial mask centered on the image, the creation default.
    pub fn radial(id: MaskId) -> Self {
        Self {
            id,
            shape: MaskShape::Radial { center: [0.5, 0.5], radius_point: [0.75, 0.5] },
            enabled: true,
            invert: false,
            feather: 0.5,
            adjustments: AdjustmentState::default(),
            raster: None,
        }
    }

    /// A linear mask spanning a vertical band, the creation default.
    pub fn linear(id: MaskId) -> Self {
        Self {
            id,
            shape: MaskShape::Linear { start: [0.5, 0.25], end: [0.5, 0.75] },
            enabled: true,
            invert: false,
            feather: 0.5,
            adjustments: AdjustmentState::default(),
            raster: None,
        }
    }

    /// Coverage at (u, v) in square UV space.
    ///
    /// See [`coverage_aspect`](Self::coverage_aspect) for the
    /// aspect-corrected form the renderer uses.
    pub fn coverage(&self, u: f32, v: f32) -> f32 {
        self.coverage_aspect(u, v, 1.0)
    }

    /// Coverage at (u, v) with horizontal aspect correction so radial
    /// masks stay circular on non-square images.
    pub fn coverage_aspect(&self, u: f32, v: f32, aspect: f32) -> f32 {
        if !self.enabled {
            return 0.0;
        }

        let raw = if let Some(raster) = &self.raster {
            raster.sample(u, v)
        } else {
            self.geometric_coverage(u, v, aspect)
        };

        let c = raw.clamp(0.0, 1.0);
        if self.invert { 1.0 - c } else { c }
    }

    fn geometric_coverage(&self, u: f32, v: f32, aspect: f32) -> f32 {
        let f = self.feather.clamp(0.0, 1.0);
        match &self.shape {
            MaskShape::Radial { center, radius_point } => {
                let p = [u * aspect, v];
                let c = [center[0] * aspect, center[1]];
                let r = [radius_point[0] * aspect, radius_point[1]];
                let radius = dist(c, r).max(1e-4);
                let t = dist(p, c) / radius;
                1.0 - smoothstep(1.0 - f, 1.0 + f, t)
            }
            MaskShape::Linear { start, end } => {
                let s = [start[0] * aspect, start[1]];
                let e = [end[0] * aspect, end[1]];
                let axis = [e[0] - s[0], e[1] - s[1]];
                let len = (axis[0] * axis[0] + axis[1] * axis[1]).sqrt().max(1e-4);
                let dir = [axis[0] / len, axis[1] / len];
                let rel = [u * aspect - s[0], v - s[1]];
                let t = (rel[0] * dir[0] + rel[1] * dir[1]) / len;
                1.0 - smoothstep(1.0 - f, 1.0 + f, t)
            }
        }
    }
}

/// Hermite smoothstep with a hard step when the edges coincide.
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn dist(a: [f32; 2], b: [f32; 2]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    (dx * dx + dy * dy).sqrt()
}

/// Painted grayscale coverage buffer.
///
/// White (1.0) is full local-adjustment strength, black (0.0) none.
/// Mutated only through [`apply_brush`](Self::apply_brush) while its
/// mask is the active one being painted; sampling is bilinear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterMask {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl RasterMask {
    /// Black (zero-coverage) raster. Both dimensions must be non-zero,
    /// the same rule [`crate::ImageBuffer::new`] applies.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Format(format!("invalid raster dimensions {width}x{height}")));
        }
        Ok(Self { width, height, data: vec![0.0; width as usize * height as usize] })
    }

    /// Raster width in texels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Raster height in texels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Grayscale texel values, row-major.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Bilinear sample at normalized (u, v), clamped to edges.
    pub fn sample(&self, u: f32, v: f32) -> f32 {
        let x = (u.clamp(0.0, 1.0) * (self.width - 1) as f32).max(0.0);
        let y = (v.clamp(0.0, 1.0) * (self.height - 1) as f32).max(0.0);
        let x0 = x.floor() as u32;
        let y0 = y.floor() as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let fx = x - x0 as f32;
        let fy = y - y0 as f32;

        let at = |px: u32, py: u32| self.data[(py * self.width + px) as usize];
        let top = at(x0, y0) * (1.0 - fx) + at(x1, y0) * fx;
        let bot = at(x0, y1) * (1.0 - fx) + at(x1, y1) * fx;
        top * (1.0 - fy) + bot * fy
    }

    /// Stamps one circular brush dab.
    ///
    /// Pure function of the arguments: same dab sequence, same raster.
    /// `value` is the target coverage (1.0 paints, 0.0 erases),
    /// `hardness` 0..1 controls the falloff inside the dab.
    pub fn apply_brush(&mut self, center: [f32; 2], radius: f32, hardness: f32, value: f32) {
        let cx = center[0] * self.width as f32;
        let cy = center[1] * self.height as f32;
        let r = (radius * self.width.max(self.height) as f32).max(0.5);
        let hard = hardness.clamp(0.0, 1.0);

        let x_min = ((cx - r).floor().max(0.0)) as u32;
        let x_max = ((cx + r).ceil() as u32).min(self.width.saturating_sub(1));
        let y_min = ((cy - r).floor().max(0.0)) as u32;
        let y_max = ((cy + r).ceil() as u32).min(self.height.saturating_sub(1));

        for y in y_min..=y_max {
            for x in x_min..=x_max {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let d = (dx * dx + dy * dy).sqrt() / r;
                if d > 1.0 {
                    continue;
                }
                // Full strength inside the hard core, smooth to the rim.
                let weight = 1.0 - smoothstep(hard, 1.0, d);
                let idx = (y * self.width + x) as usize;
                let current = self.data[idx];
                self.data[idx] = current + (value.clamp(0.0, 1.0) - current) * weight;
            }
        }
    }

    /// Inverts every texel in place.
    pub fn invert(&mut self) {
        for v in &mut self.data {
            *v = 1.0 - *v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grid(mask: &Mask) -> Vec<f32> {
        let mut out = Vec::new();
        for yi in 0..=20 {
            for xi in 0..=20 {
                out.push(mask.coverage(xi as f32 / 20.0, yi as f32 / 20.0));
            }
        }
        out
    }

    #[test]
    fn coverage_stays_in_unit_range() {
        for feather in [0.0, 0.25, 1.0] {
            let mut radial = Mask::radial(MaskId(1));
            radial.feather = feather;
            let mut linear = Mask::linear(MaskId(2));
            linear.feather = feather;
            for c in sample_grid(&radial).into_iter().chain(sample_grid(&linear)) {
                assert!((0.0..=1.0).contains(&c), "coverage {c} out of range");
            }
        }
    }

    #[test]
    fn radial_is_one_at_center_zero_past_rim() {
        let mask = Mask::radial(MaskId(1));
        assert!((mask.coverage(0.5, 0.5) - 1.0).abs() < 1e-6);
        // radius 0.25, feather 0.5 -> zero at and beyond 0.375 from center
        assert_eq!(mask.coverage(0.95, 0.5), 0.0);
    }

    #[test]
    fn zero_feather_is_a_hard_edge() {
        let mut mask = Mask::radial(MaskId(1));
        mask.feather = 0.0;
        // radius is 0.25 along x
        assert_eq!(mask.coverage(0.6, 0.5), 1.0);
        assert_eq!(mask.coverage(0.8, 0.5), 0.0);
    }

    #[test]
    fn feathered_coverage_is_continuous() {
        let mut mask = Mask::radial(MaskId(1));
        mask.feather = 0.5;
        let mut prev = mask.coverage(0.5, 0.5);
        for i in 1..=400 {
            let u = 0.5 + 0.5 * i as f32 / 400.0;
            let c = mask.coverage(u, 0.5);
            assert!((c - prev).abs() < 0.05, "jump at u={u}: {prev} -> {c}");
            prev = c;
        }
    }

    #[test]
    fn invert_flips_coverage() {
        let mut mask = Mask::radial(MaskId(1));
        let center = mask.coverage(0.5, 0.5);
        mask.invert = true;
        assert!((mask.coverage(0.5, 0.5) - (1.0 - center)).abs() < 1e-6);
    }

    #[test]
    fn disabled_mask_contributes_nothing() {
        let mut mask = Mask::radial(MaskId(1));
        mask.enabled = false;
        assert_eq!(mask.coverage(0.5, 0.5), 0.0);
    }

    #[test]
    fn linear_full_before_start_zero_after_end() {
        let mut mask = Mask::linear(MaskId(1));
        mask.feather = 0.0;
        // band runs from v=0.25 (start) to v=0.75 (end)
        assert_eq!(mask.coverage(0.5, 0.05), 1.0);
        assert_eq!(mask.coverage(0.5, 0.95), 0.0);
    }

    #[test]
    fn painted_raster_bypasses_geometry() {
        let mut mask = Mask::radial(MaskId(1));
        let mut raster = RasterMask::new(32, 32).unwrap();
        raster.apply_brush([0.9, 0.9], 0.1, 0.5, 1.0);
        mask.raster = Some(raster);
        // Geometric radial would be 1.0 here; painted raster is black.
        assert!(mask.coverage(0.5, 0.5) < 0.05);
        assert!(mask.coverage(0.9, 0.9) > 0.5);
    }

    #[test]
    fn zero_sized_raster_is_rejected() {
        assert!(RasterMask::new(0, 32).is_err());
        assert!(RasterMask::new(32, 0).is_err());
        assert!(RasterMask::new(0, 0).is_err());
    }

    #[test]
    fn brush_is_deterministic() {
        let mut a = RasterMask::new(64, 64).unwrap();
        let mut b = RasterMask::new(64, 64).unwrap();
        for raster in [&mut a, &mut b] {
            raster.apply_brush([0.3, 0.3], 0.2, 0.8, 1.0);
            raster.apply_brush([0.5, 0.5], 0.1, 0.2, 0.5);
        }
        assert_eq!(a, b);
    }

    #[test]
    fn aspect_correction_keeps_radial_circular() {
        let mask = Mask::radial(MaskId(1));
        // On a 2:1 image the x-defined radius spans twice the vertical UV
        // distance, so the on-screen shape stays a circle.
        let wide = mask.coverage_aspect(0.5, 0.75, 2.0);
        let square = mask.coverage(0.5, 0.625);
        assert!((wide - square).abs() < 1e-4);
    }
}
