//! Adobe/Resolve `.cube` 3D LUT format support.
//!
//! # Format
//!
//! ```text
//! # Comment
//! TITLE "LUT Name"
//! LUT_3D_SIZE 33
//! DOMAIN_MIN 0.0 0.0 0.0
//! DOMAIN_MAX 1.0 1.0 1.0
//! 0.0 0.0 0.0
//! ...
//! 1.0 1.0 1.0
//! ```
//!
//! Data rows are in R-fastest order. Blank lines and `#` comments are
//! ignored; the first line of three numeric tokens starts the data
//! block.
//!
//! # Recovery policy
//!
//! [`parse_str`] is lenient so a damaged LUT degrades instead of
//! blocking the editor:
//!
//! - missing `LUT_3D_SIZE` falls back to size 33 with a warning
//! - a short data block is padded with identity lattice values (safe
//!   in-range defaults, never uninitialized memory) with a warning
//! - surplus rows past `size^3` are dropped
//!
//! [`parse_strict`] rejects all three instead.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::warn;

use crate::{Lut3D, LutError, LutResult};

/// Cube edge used when a file omits `LUT_3D_SIZE`.
pub const DEFAULT_SIZE: usize = 33;

/// Reads a 3D LUT from a `.cube` file, leniently.
pub fn read<P: AsRef<Path>>(path: P) -> LutResult<Lut3D> {
    let file = File::open(path.as_ref())?;
    parse(BufReader::new(file), true)
}

/// Parses `.cube` text, applying the lenient recovery policy.
pub fn parse_str(text: &str) -> LutResult<Lut3D> {
    parse(std::io::Cursor::new(text), true)
}

/// Parses `.cube` text, rejecting missing size and short data blocks.
pub fn parse_strict(text: &str) -> LutResult<Lut3D> {
    parse(std::io::Cursor::new(text), false)
}

fn parse<R: BufRead>(reader: R, lenient: bool) -> LutResult<Lut3D> {
    let mut title = String::new();
    let mut size: Option<usize> = None;
    let mut domain_min = [0.0f32; 3];
    let mut domain_max = [1.0f32; 3];
    let mut data: Vec<[f32; 3]> = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix("TITLE") {
            title = rest.trim().trim_matches('"').to_string();
        } else if let Some(rest) = line.strip_prefix("LUT_3D_SIZE") {
            size = Some(parse_size(rest)?);
        } else if line.starts_with("LUT_1D_SIZE") {
            return Err(LutError::Parse("expected 3D LUT, found 1D".into()));
        } else if let Some(rest) = line.strip_prefix("DOMAIN_MIN") {
            domain_min = parse_triple(rest)?;
        } else if let Some(rest) = line.strip_prefix("DOMAIN_MAX") {
            domain_max = parse_triple(rest)?;
        } else if is_data_row(line) {
            // Cap at the declared point count when the size is known;
            // surplus rows carry no addressable lattice index.
            if let Some(s) = size {
                if data.len() >= s * s * s {
                    continue;
                }
            }
            data.push(parse_triple(line)?);
        } else {
            return Err(LutError::Parse(format!("unrecognized line: {line}")));
        }
    }

    let size = match size {
        Some(s) if s >= 2 => s,
        Some(s) => return Err(LutError::InvalidSize(format!("cube size {s} too small"))),
        None if lenient => {
            warn!(assumed = DEFAULT_SIZE, "cube file has no LUT_3D_SIZE, assuming default");
            DEFAULT_SIZE
        }
        None => return Err(LutError::Parse("missing LUT_3D_SIZE".into())),
    };

    let expected = size * size * size;
    if data.len() < expected {
        if !lenient {
            return Err(LutError::Parse(format!(
                "expected {expected} data rows, found {}",
                data.len()
            )));
        }
        // Pad the unread tail with identity lattice values so lookups
        // into that region return in-range passthrough colors.
        warn!(
            expected,
            found = data.len(),
            "cube data block short, padding tail with identity values"
        );
        let n = (size - 1) as f32;
        for idx in data.len()..expected {
            let r = idx % size;
            let g = (idx / size) % size;
            let b = idx / (size * size);
            data.push([r as f32 / n, g as f32 / n, b as f32 / n]);
        }
    } else if data.len() > expected {
        data.truncate(expected);
    }

    Ok(Lut3D::from_data(data, size)?
        .with_domain(domain_min, domain_max)
        .with_title(title))
}

/// Serializes a LUT to `.cube` text with 6-decimal fixed-point samples
/// in R-fastest order.
pub fn write_string(lut: &Lut3D) -> String {
    let mut out = String::with_capacity(lut.data.len() * 30 + 128);
    out.push_str("# Created by filmgrade\n");
    if !lut.title.is_empty() {
        out.push_str(&format!("TITLE \"{}\"\n", lut.title));
    }
    out.push_str(&format!("LUT_3D_SIZE {}\n", lut.size));
    out.push_str(&format!(
        "DOMAIN_MIN {:.1} {:.1} {:.1}\n",
        lut.domain_min[0], lut.domain_min[1], lut.domain_min[2]
    ));
    out.push_str(&format!(
        "DOMAIN_MAX {:.1} {:.1} {:.1}\n\n",
        lut.domain_max[0], lut.domain_max[1], lut.domain_max[2]
    ));

    // Storage is already R-fastest; emit in order.
    for rgb in &lut.data {
        out.push_str(&format!("{:.6} {:.6} {:.6}\n", rgb[0], rgb[1], rgb[2]));
    }
    out
}

/// Writes a LUT to a `.cube` file.
pub fn write<P: AsRef<Path>>(path: P, lut: &Lut3D) -> LutResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    writer.write_all(write_string(lut).as_bytes())?;
    Ok(())
}

fn is_data_row(line: &str) -> bool {
    let mut tokens = 0;
    for tok in line.split_whitespace() {
        if tok.parse::<f32>().is_err() {
            return false;
        }
        tokens += 1;
    }
    tokens == 3
}

fn parse_size(rest: &str) -> LutResult<usize> {
    rest.trim()
        .parse()
        .map_err(|_| LutError::Parse(format!("invalid LUT_3D_SIZE value: {rest}")))
}

fn parse_triple(rest: &str) -> LutResult<[f32; 3]> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(LutError::Parse(format!("expected 3 values, got: {rest}")));
    }
    let mut out = [0.0f32; 3];
    for (slot, tok) in out.iter_mut().zip(&parts) {
        *slot = tok
            .parse()
            .map_err(|_| LutError::Parse(format!("invalid number: {tok}")))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn identity_cube_text(size: usize) -> String {
        write_string(&Lut3D::identity(size))
    }

    #[test]
    fn parses_size_9_with_729_rows() {
        let lut = parse_str(&identity_cube_text(9)).unwrap();
        assert_eq!(lut.size, 9);
        assert_eq!(lut.data.len(), 729);
        assert_eq!(lut.flattened().len(), 2187);
    }

    #[test]
    fn parses_title_and_domain() {
        let text = "TITLE \"Test Grade\"\nLUT_3D_SIZE 2\nDOMAIN_MIN 0.0 0.0 0.0\nDOMAIN_MAX 2.0 2.0 2.0\n\
                    0 0 0\n1 0 0\n0 1 0\n1 1 0\n0 0 1\n1 0 1\n0 1 1\n1 1 1\n";
        let lut = parse_str(text).unwrap();
        assert_eq!(lut.title, "Test Grade");
        assert_eq!(lut.domain_max, [2.0, 2.0, 2.0]);
    }

    #[test]
    fn comments_and_blanks_are_skipped() {
        let text = "# header\n\nLUT_3D_SIZE 2\n# mid comment\n0 0 0\n1 0 0\n0 1 0\n1 1 0\n\n0 0 1\n1 0 1\n0 1 1\n1 1 1\n";
        assert_eq!(parse_str(text).unwrap().data.len(), 8);
    }

    #[test]
    fn missing_size_falls_back_to_default() {
        // Only a handful of rows and no size directive.
        let text = "TITLE \"broken\"\n0 0 0\n0.5 0.5 0.5\n1 1 1\n";
        let lut = parse_str(text).unwrap();
        assert_eq!(lut.size, DEFAULT_SIZE);
        assert_eq!(lut.data.len(), DEFAULT_SIZE.pow(3));
    }

    #[test]
    fn short_data_is_padded_with_identity() {
        let text = "LUT_3D_SIZE 3\n0 0 0\n0.5 0 0\n"; // 2 of 27 rows
        let lut = parse_str(text).unwrap();
        assert_eq!(lut.data.len(), 27);
        // Last lattice point padded with identity white, not zeros.
        let white = lut.apply([1.0, 1.0, 1.0]);
        assert_abs_diff_eq!(white[0], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(white[2], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn strict_mode_rejects_recoverable_damage() {
        assert!(parse_strict("0 0 0\n1 1 1\n").is_err());
        assert!(parse_strict("LUT_3D_SIZE 3\n0 0 0\n").is_err());
    }

    #[test]
    fn one_dimensional_luts_are_rejected() {
        let err = parse_str("LUT_1D_SIZE 256\n0 0 0\n").unwrap_err();
        assert!(matches!(err, LutError::Parse(_)));
    }

    #[test]
    fn garbage_line_is_a_parse_error() {
        assert!(parse_str("LUT_3D_SIZE 2\nhello world nope\n").is_err());
    }

    #[test]
    fn write_emits_six_decimal_rows() {
        let text = write_string(&Lut3D::identity(2));
        assert!(text.contains("LUT_3D_SIZE 2"));
        assert!(text.contains("0.000000 0.000000 0.000000"));
        assert!(text.contains("1.000000 1.000000 1.000000"));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grade.cube");
        let lut = Lut3D::identity(4).with_title("Round Trip");

        write(&path, &lut).unwrap();
        let loaded = read(&path).unwrap();

        assert_eq!(loaded.size, 4);
        assert_eq!(loaded.title, "Round Trip");
        for (a, b) in lut.data.iter().zip(&loaded.data) {
            assert_abs_diff_eq!(a[0], b[0], epsilon = 1e-6);
            assert_abs_diff_eq!(a[1], b[1], epsilon = 1e-6);
            assert_abs_diff_eq!(a[2], b[2], epsilon = 1e-6);
        }
    }

    #[test]
    fn round_trip_preserves_lattice_values_within_1e5() {
        let lut = Lut3D::identity(9);
        let reparsed = parse_str(&write_string(&lut)).unwrap();
        for k in 0..9 {
            let v = k as f32 / 8.0;
            let out = reparsed.apply([v, v, v]);
            assert_abs_diff_eq!(out[0], v, epsilon = 1e-5);
            assert_abs_diff_eq!(out[1], v, epsilon = 1e-5);
            assert_abs_diff_eq!(out[2], v, epsilon = 1e-5);
        }
    }
}
