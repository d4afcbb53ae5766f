//! `filmgrade bake-lut` - bake the grade into a .cube file.

use anyhow::{bail, Context, Result};
use tracing::info;

use grade_export::lut::export_lut_file;

use crate::BakeLutArgs;

pub fn run(args: BakeLutArgs) -> Result<()> {
    if args.size < 2 || args.size > 129 {
        bail!("cube size {} outside the supported 2..=129 range", args.size);
    }

    let adjustments = args.grade.to_state()?;
    let base = args.grade.load_lut()?;

    export_lut_file(&args.output, &adjustments, args.size, base.as_ref(), &args.title)
        .with_context(|| format!("failed to write: {}", args.output.display()))?;

    info!(output = %args.output.display(), size = args.size, "LUT baked");
    println!(
        "Baked {}x{}x{} LUT to {}",
        args.size,
        args.size,
        args.size,
        args.output.display()
    );
    Ok(())
}
