//! One image being edited: source pixels, grading state, masks.

use serde::{Deserialize, Serialize};

use crate::{AdjustmentState, ImageBuffer, Mask, MaskId};

/// An editing session for one loaded image.
///
/// The source buffer is immutable once loaded; the render pipeline is a
/// pure function of the rest. Masks are owned by the session and die
/// with it. At most one mask is active at a time: adjustment edits
/// route to the active mask's state, or to the global state when none
/// is active.
///
/// # Example
///
/// ```rust
/// use grade_core::{ImageBuffer, ImageSession};
///
/// let source = ImageBuffer::splat(64, 64, [0.5, 0.5, 0.5]).unwrap();
/// let mut session = ImageSession::new(source);
///
/// // Edits go to the global state...
/// session.adjustments_mut().exposure = 1.0;
///
/// // ...until a mask is active.
/// let id = session.add_radial_mask();
/// session.set_active_mask(Some(id));
/// session.adjustments_mut().contrast = 40.0;
///
/// assert_eq!(session.adjustments().exposure, 1.0);
/// assert_eq!(session.mask(id).unwrap().adjustments.contrast, 40.0);
/// ```
#[derive(Debug, Clone)]
pub struct ImageSession {
    source: ImageBuffer,
    adjustments: AdjustmentState,
    masks: Vec<Mask>,
    active_mask: Option<MaskId>,
    next_mask_id: u64,
}

impl ImageSession {
    /// Starts a session over an immutable source buffer.
    pub fn new(source: ImageBuffer) -> Self {
        Self {
            source,
            adjustments: AdjustmentState::default(),
            masks: Vec::new(),
            active_mask: None,
            next_mask_id: 1,
        }
    }

    /// The immutable source pixels.
    pub fn source(&self) -> &ImageBuffer {
        &self.source
    }

    /// Width/height aspect ratio used for mask coverage correction.
    pub fn aspect(&self) -> f32 {
        self.source.width() as f32 / self.source.height() as f32
    }

    /// The global adjustment state.
    pub fn adjustments(&self) -> &AdjustmentState {
        &self.adjustments
    }

    /// Routes to the active mask's adjustments when one is active,
    /// otherwise to the global state.
    pub fn adjustments_mut(&mut self) -> &mut AdjustmentState {
        match self.active_mask {
            Some(id) => {
                // Active id always refers to a live mask; see set_active_mask.
                let mask = self.masks.iter_mut().find(|m| m.id == id);
                match mask {
                    Some(m) => &mut m.adjustments,
                    None => &mut self.adjustments,
                }
            }
            None => &mut self.adjustments,
        }
    }

    /// Replaces the global state wholesale (snapshot restore).
    pub fn set_adjustments(&mut self, state: AdjustmentState) {
        self.adjustments = state.clamped();
    }

    /// Masks in compositing order (later masks composite on top).
    pub fn masks(&self) -> &[Mask] {
        &self.masks
    }

    /// Mask by id.
    pub fn mask(&self, id: MaskId) -> Option<&Mask> {
        self.masks.iter().find(|m| m.id == id)
    }

    /// Mutable mask access for geometry drags and painting.
    pub fn mask_mut(&mut self, id: MaskId) -> Option<&mut Mask> {
        self.masks.iter_mut().find(|m| m.id == id)
    }

    /// Creates a radial mask at the image center and returns its id.
    pub fn add_radial_mask(&mut self) -> MaskId {
        let id = self.alloc_mask_id();
        self.masks.push(Mask::radial(id));
        id
    }

    /// Creates a linear mask spanning a vertical band and returns its id.
    pub fn add_linear_mask(&mut self) -> MaskId {
        let id = self.alloc_mask_id();
        self.masks.push(Mask::linear(id));
        id
    }

    /// Deletes a mask; clears the active selection if it pointed here.
    pub fn remove_mask(&mut self, id: MaskId) {
        self.masks.retain(|m| m.id != id);
        if self.active_mask == Some(id) {
            self.active_mask = None;
        }
    }

    /// The mask currently receiving edits, if any.
    pub fn active_mask(&self) -> Option<MaskId> {
        self.active_mask
    }

    /// Selects the mask receiving edits. Ignores ids of deleted masks.
    pub fn set_active_mask(&mut self, id: Option<MaskId>) {
        self.active_mask = match id {
            Some(id) if self.mask(id).is_some() => Some(id),
            _ => None,
        };
    }

    /// Serializable snapshot of the full grading state (global
    /// adjustments plus mask descriptors), consumed by history.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            adjustments: self.adjustments.clone(),
            masks: self.masks.clone(),
            active_mask: self.active_mask,
        }
    }

    /// Restores a snapshot produced by [`snapshot`](Self::snapshot).
    pub fn restore(&mut self, snap: SessionSnapshot) {
        self.next_mask_id = snap
            .masks
            .iter()
            .map(|m| m.id.0 + 1)
            .max()
            .unwrap_or(1)
            .max(self.next_mask_id);
        self.adjustments = snap.adjustments;
        self.masks = snap.masks;
        self.active_mask = snap.active_mask.filter(|id| self.mask(*id).is_some());
    }

    fn alloc_mask_id(&mut self) -> MaskId {
        let id = MaskId(self.next_mask_id);
        self.next_mask_id += 1;
        id
    }
}

/// Serializable grading state of a session, without the source pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Global adjustments.
    pub adjustments: AdjustmentState,
    /// Mask descriptors in compositing order.
    pub masks: Vec<Mask>,
    /// Active mask selection.
    pub active_mask: Option<MaskId>,
}
