//! Renderer lifecycle state machine.
//!
//! Pure bookkeeping, no GPU types, so the transition rules are unit
//! tested without an adapter. The [`Renderer`](crate::Renderer) owns
//! one tracker and consults it before every operation.
//!
//! ```text
//! Uninitialized --load--> ImageLoaded --render--> Idle <--> Rendering
//!        \                     |                    |
//!         \                    +------ lost -------+---> Lost --recover--> Idle
//! ```

use crate::{GpuError, GpuResult};

/// Lifecycle phase of the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Device up, no image loaded.
    Uninitialized,
    /// Image uploaded, nothing rendered yet.
    ImageLoaded,
    /// At least one render completed; ready for the next.
    Idle,
    /// A render pass is in flight.
    Rendering,
    /// Device lost; only [`StateTracker::recover`] is legal.
    Lost,
}

/// Validates lifecycle transitions and produces uniform errors for
/// illegal ones.
#[derive(Debug)]
pub struct StateTracker {
    state: PipelineState,
}

impl StateTracker {
    /// Fresh tracker in `Uninitialized`.
    pub fn new() -> Self {
        Self { state: PipelineState::Uninitialized }
    }

    /// Current state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn guard(&self, op: &str, allowed: &[PipelineState]) -> GpuResult<()> {
        if self.state == PipelineState::Lost {
            return Err(GpuError::ContextLost);
        }
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(GpuError::InvalidState(format!("{op} not allowed in {:?}", self.state)))
        }
    }

    /// A new image may be loaded in any live state, replacing the
    /// previous one.
    pub fn load_image(&mut self) -> GpuResult<()> {
        self.guard(
            "load_image",
            &[PipelineState::Uninitialized, PipelineState::ImageLoaded, PipelineState::Idle],
        )?;
        self.state = PipelineState::ImageLoaded;
        Ok(())
    }

    /// Marks a render pass as started.
    pub fn begin_render(&mut self) -> GpuResult<()> {
        self.guard("render", &[PipelineState::ImageLoaded, PipelineState::Idle])?;
        self.state = PipelineState::Rendering;
        Ok(())
    }

    /// Marks the in-flight render as finished.
    pub fn finish_render(&mut self) {
        if self.state == PipelineState::Rendering {
            self.state = PipelineState::Idle;
        }
    }

    /// Records device loss. Every subsequent operation fails with
    /// [`GpuError::ContextLost`] until [`recover`](Self::recover).
    pub fn mark_lost(&mut self) {
        self.state = PipelineState::Lost;
    }

    /// Completes recovery after the device and resources were rebuilt.
    pub fn recover(&mut self, image_loaded: bool) {
        self.state = if image_loaded { PipelineState::Idle } else { PipelineState::Uninitialized };
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_before_load_is_rejected() {
        let mut t = StateTracker::new();
        assert!(matches!(t.begin_render(), Err(GpuError::InvalidState(_))));
    }

    #[test]
    fn normal_lifecycle() {
        let mut t = StateTracker::new();
        t.load_image().unwrap();
        assert_eq!(t.state(), PipelineState::ImageLoaded);
        t.begin_render().unwrap();
        assert_eq!(t.state(), PipelineState::Rendering);
        t.finish_render();
        assert_eq!(t.state(), PipelineState::Idle);
        t.begin_render().unwrap();
        t.finish_render();
    }

    #[test]
    fn reload_replaces_image_from_idle() {
        let mut t = StateTracker::new();
        t.load_image().unwrap();
        t.begin_render().unwrap();
        t.finish_render();
        t.load_image().unwrap();
        assert_eq!(t.state(), PipelineState::ImageLoaded);
    }

    #[test]
    fn lost_blocks_everything_until_recover() {
        let mut t = StateTracker::new();
        t.load_image().unwrap();
        t.mark_lost();
        assert!(matches!(t.begin_render(), Err(GpuError::ContextLost)));
        assert!(matches!(t.load_image(), Err(GpuError::ContextLost)));

        t.recover(true);
        assert_eq!(t.state(), PipelineState::Idle);
        t.begin_render().unwrap();
    }

    #[test]
    fn recover_without_image_restarts_empty() {
        let mut t = StateTracker::new();
        t.mark_lost();
        t.recover(false);
        assert_eq!(t.state(), PipelineState::Uninitialized);
        assert!(t.begin_render().is_err());
    }
}
