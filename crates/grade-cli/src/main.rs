//! filmgrade - film-emulation color grading CLI
//!
//! Applies the grading pipeline to still images, bakes grades into
//! `.cube` LUTs, batch-processes folders and prints scope analyses.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "filmgrade")]
#[command(author, version, about = "Film-emulation color grading pipeline")]
#[command(long_about = "
GPU color grading for still images: exposure through film effects,
local masks, 3D LUTs, scopes and batch export.

Examples:
  filmgrade apply photo.jpg -o graded.png --exposure 0.5 --contrast 20
  filmgrade apply photo.jpg -o graded.jpg --lut look.cube --lut-intensity 0.8
  filmgrade apply photo.jpg -o out.png --radial-mask --mask-exposure 1.0
  filmgrade bake-lut -o look.cube --contrast 30 --fade 20 --size 33
  filmgrade batch shots/*.jpg -o graded/ --halation 40 --grain 25
  filmgrade scope graded.png --histogram --waveform
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade one image and write the result
    #[command(visible_alias = "a")]
    Apply(ApplyArgs),

    /// Bake the grade into a .cube 3D LUT
    #[command(name = "bake-lut", visible_alias = "bl")]
    BakeLut(BakeLutArgs),

    /// Grade many images with the same settings
    #[command(visible_alias = "b")]
    Batch(BatchArgs),

    /// Print scope analyses of an image
    #[command(visible_alias = "s")]
    Scope(ScopeArgs),
}

/// The grading sliders, shared by apply, bake-lut and batch.
#[derive(Args, Clone)]
struct GradeArgs {
    /// Load a saved adjustment snapshot (JSON); sliders set on the
    /// command line override its fields
    #[arg(long, value_name = "FILE")]
    adjustments: Option<PathBuf>,

    /// Exposure in stops
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    exposure: f32,

    /// Contrast, -100..100
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    contrast: f32,

    /// Highlights, -100..100
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    highlights: f32,

    /// Shadows, -100..100
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    shadows: f32,

    /// Whites, -100..100
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    whites: f32,

    /// Blacks, -100..100
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    blacks: f32,

    /// Temperature, -100 (cool) .. 100 (warm)
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    temperature: f32,

    /// Tint, -100 (green) .. 100 (magenta)
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    tint: f32,

    /// Vibrance, -100..100
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    vibrance: f32,

    /// Saturation, -100..100
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    saturation: f32,

    /// Clarity, -100..100
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    clarity: f32,

    /// Dehaze, -100..100
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    dehaze: f32,

    /// Sharpness, 0..100
    #[arg(long, default_value = "0")]
    sharpness: f32,

    /// Film fade, 0..100
    #[arg(long, default_value = "0")]
    fade: f32,

    /// Halation strength, 0..100
    #[arg(long, default_value = "0")]
    halation: f32,

    /// Grain amount, 0..100
    #[arg(long, default_value = "0")]
    grain: f32,

    /// Grain size in pixels
    #[arg(long, default_value = "2.0")]
    grain_size: f32,

    /// Vignette amount, 0..100
    #[arg(long, default_value = "0")]
    vignette: f32,

    /// Vignette midpoint, 0..1
    #[arg(long, default_value = "0.5")]
    vignette_midpoint: f32,

    /// 3D LUT file (.cube)
    #[arg(long)]
    lut: Option<PathBuf>,

    /// LUT blend, 0..1
    #[arg(long, default_value = "1.0")]
    lut_intensity: f32,
}

#[derive(Args)]
struct ApplyArgs {
    /// Input image (PNG or JPEG)
    input: PathBuf,

    /// Output image
    #[arg(short, long)]
    output: PathBuf,

    /// JPEG quality, 1..=100
    #[arg(short = 'q', long, default_value = "90")]
    quality: u8,

    /// Render on the GPU when an adapter is available
    #[arg(long)]
    gpu: bool,

    /// Grain seed (fixed so reruns are reproducible)
    #[arg(long, default_value = "0")]
    seed: f32,

    /// Add a centered radial mask carrying the mask sliders
    #[arg(long)]
    radial_mask: bool,

    /// Add a top-to-bottom linear mask carrying the mask sliders
    #[arg(long)]
    linear_mask: bool,

    /// Invert the mask
    #[arg(long)]
    mask_invert: bool,

    /// Mask feather, 0..1
    #[arg(long, default_value = "0.5")]
    mask_feather: f32,

    /// Exposure inside the mask, in stops
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    mask_exposure: f32,

    /// Temperature inside the mask
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    mask_temperature: f32,

    /// Saturation inside the mask
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    mask_saturation: f32,

    #[command(flatten)]
    grade: GradeArgs,
}

#[derive(Args)]
struct BakeLutArgs {
    /// Output .cube file
    #[arg(short, long)]
    output: PathBuf,

    /// Cube edge size (17, 33 or 65)
    #[arg(short, long, default_value = "33")]
    size: usize,

    /// LUT title written to the header
    #[arg(short, long, default_value = "filmgrade")]
    title: String,

    #[command(flatten)]
    grade: GradeArgs,
}

#[derive(Args)]
struct BatchArgs {
    /// Input images
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    output: PathBuf,

    /// Output format: png or jpeg
    #[arg(short, long, default_value = "png")]
    format: String,

    /// JPEG quality, 1..=100
    #[arg(short = 'q', long, default_value = "90")]
    quality: u8,

    /// Grain seed
    #[arg(long, default_value = "0")]
    seed: f32,

    #[command(flatten)]
    grade: GradeArgs,
}

#[derive(Args)]
struct ScopeArgs {
    /// Input image
    input: PathBuf,

    /// Print the luma/RGB histogram summary
    #[arg(long)]
    histogram: bool,

    /// Print the waveform summary
    #[arg(long)]
    waveform: bool,

    /// Print the vectorscope summary
    #[arg(long)]
    vectorscope: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    match cli.command {
        Commands::Apply(args) => commands::apply::run(args),
        Commands::BakeLut(args) => commands::bake_lut::run(args),
        Commands::Batch(args) => commands::batch::run(args),
        Commands::Scope(args) => commands::scope::run(args),
    }
}

impl GradeArgs {
    /// Resolves the snapshot file (when given) and the CLI sliders
    /// into one adjustment state. Sliders left at their neutral
    /// default keep the snapshot's value.
    fn to_state(&self) -> Result<grade_core::AdjustmentState> {
        let mut adj = match &self.adjustments {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read: {}", path.display()))?;
                grade_core::AdjustmentState::from_snapshot(&json)
                    .with_context(|| format!("bad adjustment snapshot: {}", path.display()))?
            }
            None => grade_core::AdjustmentState::default(),
        };

        let over = |slot: &mut f32, value: f32, default: f32| {
            if value != default {
                *slot = value;
            }
        };
        over(&mut adj.exposure, self.exposure, 0.0);
        over(&mut adj.contrast, self.contrast, 0.0);
        over(&mut adj.highlights, self.highlights, 0.0);
        over(&mut adj.shadows, self.shadows, 0.0);
        over(&mut adj.whites, self.whites, 0.0);
        over(&mut adj.blacks, self.blacks, 0.0);
        over(&mut adj.temperature, self.temperature, 0.0);
        over(&mut adj.tint, self.tint, 0.0);
        over(&mut adj.vibrance, self.vibrance, 0.0);
        over(&mut adj.saturation, self.saturation, 0.0);
        over(&mut adj.clarity, self.clarity, 0.0);
        over(&mut adj.dehaze, self.dehaze, 0.0);
        over(&mut adj.sharpness, self.sharpness, 0.0);
        over(&mut adj.fade, self.fade, 0.0);
        over(&mut adj.halation, self.halation, 0.0);
        over(&mut adj.grain_amount, self.grain, 0.0);
        over(&mut adj.grain_size, self.grain_size, 2.0);
        over(&mut adj.vignette_amount, self.vignette, 0.0);
        over(&mut adj.vignette_midpoint, self.vignette_midpoint, 0.5);
        over(&mut adj.lut_intensity, self.lut_intensity, 1.0);
        if let Some(path) = &self.lut {
            adj.lut_id = Some(path.display().to_string());
        }
        Ok(adj.clamped())
    }

    /// Loads the LUT named by `--lut`, if any.
    fn load_lut(&self) -> Result<Option<grade_lut::Lut3D>> {
        match &self.lut {
            Some(path) => {
                let lut = grade_lut::cube::read(path)
                    .with_context(|| format!("failed to read LUT: {}", path.display()))?;
                Ok(Some(lut))
            }
            None => Ok(None),
        }
    }
}
