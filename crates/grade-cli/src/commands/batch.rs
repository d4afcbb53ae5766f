//! `filmgrade batch` - grade many images with one setting.

use anyhow::{bail, Result};
use tracing::info;

use grade_export::{BatchExporter, BatchJob, BatchStatus, CancelToken, ExportFormat};

use crate::BatchArgs;

pub fn run(args: BatchArgs) -> Result<()> {
    let format = match args.format.to_ascii_lowercase().as_str() {
        "png" => ExportFormat::Png,
        "jpg" | "jpeg" => ExportFormat::Jpeg { quality: args.quality },
        other => bail!("unsupported format: {other} (expected png or jpeg)"),
    };
    let extension = match format {
        ExportFormat::Png => "png",
        ExportFormat::Jpeg { .. } => "jpg",
    };

    std::fs::create_dir_all(&args.output)?;

    let adjustments = args.grade.to_state()?;
    let lut = args.grade.load_lut()?;

    let mut jobs = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        jobs.push(BatchJob {
            image: super::load_image(input)?,
            adjustments: adjustments.clone(),
            masks: Vec::new(),
            output: args.output.join(format!("{stem}.{extension}")),
            format,
        });
    }

    info!(jobs = jobs.len(), "starting batch");
    let token = CancelToken::new();
    let report = BatchExporter::new()
        .with_lut(lut)
        .with_grain_seed(args.seed)
        .run(&jobs, &token, |done, total| {
            println!("[{done}/{total}] done");
        })?;

    match report.status {
        BatchStatus::Completed => println!("Batch complete: {} images", report.completed),
        BatchStatus::Cancelled => {
            println!("Batch cancelled after {} of {} images", report.completed, report.total)
        }
    }
    Ok(())
}
