//! The canonical adjustment record.
//!
//! # Overview
//!
//! [`AdjustmentState`] is a flat, serializable map of every grading
//! parameter. It exists once globally per image and once per local mask
//! as an override. A zero-valued state is an exact no-op transform: the
//! identity invariant the whole pipeline is tested against.
//!
//! The JSON form is the interchange format consumed by history (undo
//! snapshots) and the sharing path. All fields carry `#[serde(default)]`
//! so partial snapshots load with explicit neutral values rather than
//! ad hoc fallbacks at each use site.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// All grading parameters for one scope (global or per-mask).
///
/// Ranges follow the UI contract: slider-style fields are -100..100,
/// `exposure` is in stops (typically -5..5), `lut_intensity` is 0..1.
/// Every numeric field defaults to its neutral value.
///
/// # Example
///
/// ```rust
/// use grade_core::AdjustmentState;
///
/// let state = AdjustmentState::default();
/// assert!(state.is_neutral());
///
/// let mut graded = state.clone();
/// graded.exposure = 1.0;
/// assert!(!graded.is_neutral());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustmentState {
    // Tone
    /// Exposure in stops. +1 doubles linear RGB.
    pub exposure: f32,
    /// Contrast around mid-gray, -100..100.
    pub contrast: f32,
    /// Highlight recovery/lift, -100..100.
    pub highlights: f32,
    /// Shadow lift, -100..100.
    pub shadows: f32,
    /// White point lift, -100..100.
    pub whites: f32,
    /// Black point lift, -100..100.
    pub blacks: f32,

    // Color
    /// Warm/cool shift on R/B channels, -100..100.
    pub temperature: f32,
    /// Green/magenta shift, -100..100.
    pub tint: f32,
    /// Saturation weighted toward muted pixels, -100..100.
    pub vibrance: f32,
    /// Uniform saturation, -100..100.
    pub saturation: f32,

    // Detail
    /// Midtone local contrast, -100..100.
    pub clarity: f32,
    /// Atmospheric haze removal, -100..100.
    pub dehaze: f32,
    /// Unsharp-mask strength, -100..100. Spatial: preview-resolution
    /// dependent, excluded from LUT baking.
    pub sharpness: f32,
    /// Film grain strength, 0..100.
    pub grain_amount: f32,
    /// Grain particle size in pixels at native resolution.
    pub grain_size: f32,

    // Creative
    /// Vignette strength, 0..100.
    pub vignette_amount: f32,
    /// Vignette onset as normalized distance from center, 0..1.
    pub vignette_midpoint: f32,
    /// Faded-film black lift, 0..100.
    pub fade: f32,
    /// Halation (blurred highlight bloom) strength, 0..100.
    pub halation: f32,
    /// Identifier of the selected 3D LUT, if any.
    pub lut_id: Option<String>,
    /// LUT blend factor, 0..1. Defaults to 1.0 so a newly selected LUT
    /// is applied at full strength; with `lut_id` unset this has no
    /// effect, preserving the identity invariant.
    pub lut_intensity: f32,
}

impl Default for AdjustmentState {
    fn default() -> Self {
        Self {
            exposure: 0.0,
            contrast: 0.0,
            highlights: 0.0,
            shadows: 0.0,
            whites: 0.0,
            blacks: 0.0,
            temperature: 0.0,
            tint: 0.0,
            vibrance: 0.0,
            saturation: 0.0,
            clarity: 0.0,
            dehaze: 0.0,
            sharpness: 0.0,
            grain_amount: 0.0,
            grain_size: 2.0,
            vignette_amount: 0.0,
            vignette_midpoint: 0.5,
            fade: 0.0,
            halation: 0.0,
            lut_id: None,
            lut_intensity: 1.0,
        }
    }
}

impl AdjustmentState {
    /// Identity state (no change).
    pub fn neutral() -> Self {
        Self::default()
    }

    /// True when every parameter is at its neutral value and no LUT is
    /// selected, i.e. the transform is a provable no-op.
    pub fn is_neutral(&self) -> bool {
        self.exposure == 0.0
            && self.contrast == 0.0
            && self.highlights == 0.0
            && self.shadows == 0.0
            && self.whites == 0.0
            && self.blacks == 0.0
            && self.temperature == 0.0
            && self.tint == 0.0
            && self.vibrance == 0.0
            && self.saturation == 0.0
            && self.clarity == 0.0
            && self.dehaze == 0.0
            && self.sharpness == 0.0
            && self.grain_amount == 0.0
            && self.vignette_amount == 0.0
            && self.fade == 0.0
            && self.halation == 0.0
            && self.lut_id.is_none()
    }

    /// Serializes to the flat JSON snapshot format (history / sharing).
    pub fn to_snapshot(&self) -> String {
        // Flat struct of numbers and one optional string; cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Loads a snapshot produced by [`to_snapshot`](Self::to_snapshot).
    ///
    /// Missing fields default to neutral; unknown fields are ignored so
    /// older snapshots keep loading.
    pub fn from_snapshot(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Format(format!("bad snapshot: {e}")))
    }

    /// Clamps every field to its documented range. Applied at the
    /// boundary when loading external snapshots.
    pub fn clamped(mut self) -> Self {
        let pct = |v: f32| v.clamp(-100.0, 100.0);
        self.exposure = self.exposure.clamp(-5.0, 5.0);
        self.contrast = pct(self.contrast);
        self.highlights = pct(self.highlights);
        self.shadows = pct(self.shadows);
        self.whites = pct(self.whites);
        self.blacks = pct(self.blacks);
        self.temperature = pct(self.temperature);
        self.tint = pct(self.tint);
        self.vibrance = pct(self.vibrance);
        self.saturation = pct(self.saturation);
        self.clarity = pct(self.clarity);
        self.dehaze = pct(self.dehaze);
        self.sharpness = pct(self.sharpness);
        self.grain_amount = self.grain_amount.clamp(0.0, 100.0);
        self.grain_size = self.grain_size.clamp(0.5, 16.0);
        self.vignette_amount = self.vignette_amount.clamp(0.0, 100.0);
        self.vignette_midpoint = self.vignette_midpoint.clamp(0.0, 1.0);
        self.fade = self.fade.clamp(0.0, 100.0);
        self.halation = self.halation.clamp(0.0, 100.0);
        self.lut_intensity = self.lut_intensity.clamp(0.0, 1.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_neutral() {
        assert!(AdjustmentState::default().is_neutral());
    }

    #[test]
    fn snapshot_round_trip() {
        let mut state = AdjustmentState::default();
        state.exposure = 1.5;
        state.contrast = 25.0;
        state.lut_id = Some("kodak_gold".into());
        state.lut_intensity = 0.7;

        let json = state.to_snapshot();
        let restored = AdjustmentState::from_snapshot(&json).unwrap();
        assert_eq!(state, restored);
    }

    #[test]
    fn partial_snapshot_defaults_missing_fields() {
        let restored = AdjustmentState::from_snapshot(r#"{"exposure": 2.0}"#).unwrap();
        assert_eq!(restored.exposure, 2.0);
        assert_eq!(restored.contrast, 0.0);
        assert_eq!(restored.lut_intensity, 1.0);
    }

    #[test]
    fn malformed_snapshot_is_format_error() {
        let err = AdjustmentState::from_snapshot("{nope").unwrap_err();
        assert!(matches!(err, crate::Error::Format(_)));
    }

    #[test]
    fn clamped_enforces_ranges() {
        let mut state = AdjustmentState::default();
        state.exposure = 12.0;
        state.saturation = -500.0;
        state.lut_intensity = 3.0;
        let state = state.clamped();
        assert_eq!(state.exposure, 5.0);
        assert_eq!(state.saturation, -100.0);
        assert_eq!(state.lut_intensity, 1.0);
    }
}
