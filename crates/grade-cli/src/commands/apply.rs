//! `filmgrade apply` - grade one image.

use anyhow::{bail, Context, Result};
use tracing::info;

use grade_core::{Mask, MaskId};
use grade_export::{save, ExportFormat};
use grade_gpu::{RenderSnapshot, Renderer};
use grade_ops::chain::GradeStack;
use grade_ops::cpu::{render_reference, RenderOptions};

use crate::ApplyArgs;

pub fn run(args: ApplyArgs) -> Result<()> {
    let image = super::load_image(&args.input)?;
    let adjustments = args.grade.to_state()?;
    let lut = args.grade.load_lut()?;

    let mut masks = Vec::new();
    if args.radial_mask || args.linear_mask {
        let mut mask = if args.radial_mask {
            Mask::radial(MaskId(1))
        } else {
            Mask::linear(MaskId(1))
        };
        mask.invert = args.mask_invert;
        mask.feather = args.mask_feather.clamp(0.0, 1.0);
        mask.adjustments.exposure = args.mask_exposure;
        mask.adjustments.temperature = args.mask_temperature;
        mask.adjustments.saturation = args.mask_saturation;
        masks.push(mask);
    }

    let rendered = if args.gpu && Renderer::is_available() {
        info!("rendering on the GPU");
        let mut renderer = Renderer::new()?;
        renderer.load_image(&image)?;
        renderer.set_lut(lut);
        renderer.stage(RenderSnapshot {
            adjustments: adjustments.clone(),
            masks,
            grain_seed: args.seed,
        });
        renderer.render_highres()?
    } else {
        if args.gpu {
            info!("no GPU adapter, falling back to the CPU path");
        }
        let aspect = image.width() as f32 / image.height() as f32;
        let stack = GradeStack {
            global: &adjustments,
            masks: &masks,
            lut: lut.as_ref(),
            aspect,
        };
        render_reference(&image, &stack, &RenderOptions { grain_seed: args.seed })
    };

    let format = match ExportFormat::from_extension(&args.output) {
        Some(ExportFormat::Jpeg { .. }) => ExportFormat::Jpeg { quality: args.quality },
        Some(f) => f,
        None => bail!("unsupported output extension: {}", args.output.display()),
    };
    save(&args.output, &rendered, format)
        .with_context(|| format!("failed to write: {}", args.output.display()))?;

    info!(output = %args.output.display(), "graded image written");
    Ok(())
}
