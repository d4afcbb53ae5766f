//! # grade-export
//!
//! Final delivery: 8-bit image encoding ([`encode`]), baked `.cube`
//! export ([`export_lut_file`](lut::export_lut_file)) and the
//! cancellable [`BatchExporter`](batch::BatchExporter).
//!
//! Cancellation is cooperative and job-granular: the batch checks its
//! [`CancelToken`](batch::CancelToken) between jobs, so a cancel
//! requested while job N runs lets N finish and prevents N+1 from
//! starting. A cancelled batch is a normal outcome
//! ([`BatchStatus::Cancelled`](batch::BatchStatus)), not an error.

#![warn(missing_docs)]

pub mod batch;
pub mod encode;
pub mod lut;

mod error;

pub use batch::{BatchExporter, BatchJob, BatchReport, BatchStatus, CancelToken};
pub use encode::{encode, save, ExportFormat};
pub use error::{ExportError, ExportResult};
