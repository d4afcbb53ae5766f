//! Cancellable batch export.
//!
//! Jobs run sequentially; the token is checked before each job starts,
//! so cancelling while job N renders lets N finish and prevents N+1
//! from starting. The report counts fully completed jobs.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use grade_core::{AdjustmentState, ImageBuffer, Mask};
use grade_lut::Lut3D;
use grade_ops::chain::GradeStack;
use grade_ops::cpu::{render_reference, RenderOptions};

use crate::encode::{save, ExportFormat};
use crate::ExportResult;

/// Shared cancellation flag, clonable across threads.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// A fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// True once [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// One image to grade and write.
#[derive(Debug, Clone)]
pub struct BatchJob {
    /// Source pixels.
    pub image: ImageBuffer,
    /// Global adjustments for this image.
    pub adjustments: AdjustmentState,
    /// Masks in compositing order.
    pub masks: Vec<Mask>,
    /// Destination path.
    pub output: PathBuf,
    /// Output format.
    pub format: ExportFormat,
}

/// How a batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Every job ran.
    Completed,
    /// Cancelled before all jobs ran. Not an error.
    Cancelled,
}

/// Outcome of one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Jobs that finished (rendered and written).
    pub completed: usize,
    /// Jobs submitted.
    pub total: usize,
    /// Terminal status.
    pub status: BatchStatus,
}

/// Sequential batch runner over the CPU render path.
pub struct BatchExporter {
    lut: Option<Lut3D>,
    grain_seed: f32,
}

impl BatchExporter {
    /// Exporter with no LUT and a zero grain seed.
    pub fn new() -> Self {
        Self { lut: None, grain_seed: 0.0 }
    }

    /// Applies this LUT to every job.
    pub fn with_lut(mut self, lut: Option<Lut3D>) -> Self {
        self.lut = lut;
        self
    }

    /// Grain seed used for all jobs.
    pub fn with_grain_seed(mut self, seed: f32) -> Self {
        self.grain_seed = seed;
        self
    }

    /// Runs the jobs in order. `progress` is called with the completed
    /// count after each finished job.
    pub fn run<F>(
        &self,
        jobs: &[BatchJob],
        token: &CancelToken,
        mut progress: F,
    ) -> ExportResult<BatchReport>
    where
        F: FnMut(usize, usize),
    {
        let total = jobs.len();
        let mut completed = 0usize;

        for job in jobs {
            if token.is_cancelled() {
                warn!(completed, total, "batch cancelled");
                return Ok(BatchReport { completed, total, status: BatchStatus::Cancelled });
            }

            let aspect = job.image.width() as f32 / job.image.height().max(1) as f32;
            let stack = GradeStack {
                global: &job.adjustments,
                masks: &job.masks,
                lut: self.lut.as_ref(),
                aspect,
            };
            let rendered = render_reference(
                &job.image,
                &stack,
                &RenderOptions { grain_seed: self.grain_seed },
            );
            save(&job.output, &rendered, job.format)?;

            completed += 1;
            progress(completed, total);
        }

        info!(total, "batch completed");
        Ok(BatchReport { completed, total, status: BatchStatus::Completed })
    }
}

impl Default for BatchExporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jobs_in(dir: &std::path::Path, count: usize) -> Vec<BatchJob> {
        (0..count)
            .map(|i| BatchJob {
                image: ImageBuffer::splat(8, 8, [0.4, 0.5, 0.6]).unwrap(),
                adjustments: AdjustmentState::default(),
                masks: Vec::new(),
                output: dir.join(format!("out_{i}.png")),
                format: ExportFormat::Png,
            })
            .collect()
    }

    #[test]
    fn full_batch_completes_and_writes_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = jobs_in(dir.path(), 4);
        let token = CancelToken::new();

        let mut seen = Vec::new();
        let report = BatchExporter::new()
            .run(&jobs, &token, |done, total| seen.push((done, total)))
            .unwrap();

        assert_eq!(report.status, BatchStatus::Completed);
        assert_eq!(report.completed, 4);
        assert_eq!(seen, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
        for job in &jobs {
            assert!(job.output.exists());
        }
    }

    #[test]
    fn cancel_after_three_of_ten_stops_before_the_fourth() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = jobs_in(dir.path(), 10);
        let token = CancelToken::new();

        let cancel_from = token.clone();
        let report = BatchExporter::new()
            .run(&jobs, &token, |done, _| {
                if done == 3 {
                    cancel_from.cancel();
                }
            })
            .unwrap();

        assert_eq!(report.status, BatchStatus::Cancelled);
        assert_eq!(report.completed, 3);
        assert_eq!(report.total, 10);
        assert!(jobs[2].output.exists());
        assert!(!jobs[3].output.exists(), "fourth job must never start");
    }

    #[test]
    fn pre_cancelled_batch_runs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = jobs_in(dir.path(), 3);
        let token = CancelToken::new();
        token.cancel();

        let report = BatchExporter::new().run(&jobs, &token, |_, _| {}).unwrap();
        assert_eq!(report.status, BatchStatus::Cancelled);
        assert_eq!(report.completed, 0);
        assert!(!jobs[0].output.exists());
    }

    #[test]
    fn empty_batch_is_trivially_complete() {
        let token = CancelToken::new();
        let report = BatchExporter::new().run(&[], &token, |_, _| {}).unwrap();
        assert_eq!(report.status, BatchStatus::Completed);
        assert_eq!(report.completed, 0);
    }
}
