//! `filmgrade scope` - print scope analyses.

use anyhow::Result;

use grade_scopes::{Histogram, Vectorscope, Waveform};

use crate::ScopeArgs;

pub fn run(args: ScopeArgs) -> Result<()> {
    let image = super::load_image(&args.input)?;
    let total = image.width() as u64 * image.height() as u64;
    // Default to everything when no scope flag was given.
    let all = !(args.histogram || args.waveform || args.vectorscope);

    println!("{}: {}x{}", args.input.display(), image.width(), image.height());

    if args.histogram || all {
        let h = Histogram::compute(&image);
        let (black, white) = h.clip_fractions(total);
        println!("\nHistogram (peak bin count {}):", h.max_count());
        println!("  clipped black: {:.2}%", black * 100.0);
        println!("  clipped white: {:.2}%", white * 100.0);
        for (name, series) in [("R", &h.r), ("G", &h.g), ("B", &h.b), ("Y", &h.luma)] {
            println!("  {name} mean level: {:.3}", mean_level(series));
        }
    }

    if args.waveform || all {
        let w = Waveform::compute(&image);
        let mut lows = 0u64;
        let mut highs = 0u64;
        for row in 0..Waveform::ROWS {
            let sum: u64 = (0..w.columns).map(|c| w.at(c, row) as u64).sum();
            if row < 16 {
                lows += sum;
            } else if row >= 240 {
                highs += sum;
            }
        }
        println!("\nWaveform ({} columns):", w.columns);
        println!("  pixels below 6% luma: {:.2}%", lows as f64 / total as f64 * 100.0);
        println!("  pixels above 94% luma: {:.2}%", highs as f64 / total as f64 * 100.0);
    }

    if args.vectorscope || all {
        let v = Vectorscope::compute(&image);
        let c = Vectorscope::center();
        let neutral: u64 = (c - 2..=c + 2)
            .flat_map(|cr| (c - 2..=c + 2).map(move |cb| (cb, cr)))
            .map(|(cb, cr)| v.at(cb, cr) as u64)
            .sum();
        println!("\nVectorscope:");
        println!("  near-neutral pixels: {:.2}%", neutral as f64 / total as f64 * 100.0);
    }

    Ok(())
}

/// Mean bin index of a 256-bin series, normalized to 0..1.
fn mean_level(series: &[u32]) -> f32 {
    let total: u64 = series.iter().map(|&c| c as u64).sum();
    if total == 0 {
        return 0.0;
    }
    let weighted: u64 = series.iter().enumerate().map(|(i, &c)| i as u64 * c as u64).sum();
    weighted as f32 / total as f32 / 255.0
}
