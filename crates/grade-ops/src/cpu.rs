//! CPU reference renderer.
//!
//! Mirrors the GPU pipeline stage for stage (sharpen, grade chain,
//! masks, LUT, halation, grain, vignette) so GPU output can be checked
//! against it and headless callers can render without an adapter.
//! Rows are processed in parallel with rayon.

use grade_core::ImageBuffer;
use rayon::prelude::*;

use crate::chain::GradeStack;
use crate::shaders::{HALATION_KNEE, HALATION_THRESHOLD};

/// Gaussian weights shared with the `BLUR_H`/`BLUR_V` kernels.
const BLUR_WEIGHTS: [f32; 5] = [0.227027, 0.194595, 0.121622, 0.054054, 0.016216];

/// Warm tint applied to the halation bloom before compositing.
const HALATION_TINT: [f32; 3] = [1.0, 0.6, 0.35];

/// Per-render inputs that are not part of the session state.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Grain noise seed, fixed per render so preview and export agree.
    pub grain_seed: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { grain_seed: 0.0 }
    }
}

/// Renders one frame on the CPU. Output has the same dimensions and
/// channel count as the input; values are clamped to [0,1].
pub fn render_reference(src: &ImageBuffer, stack: &GradeStack, opts: &RenderOptions) -> ImageBuffer {
    let width = src.width();
    let height = src.height();
    let channels = src.channels() as usize;
    let adj = stack.global;

    let sharp = adj.sharpness / 100.0;

    // Stage 1: sharpen + color chain + masks + LUT.
    let mut graded = src.clone();
    {
        let row_len = width as usize * channels;
        let src_data = src.data();
        graded
            .data_mut()
            .par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| {
                let y = y as u32;
                let v = (y as f32 + 0.5) / height as f32;
                for x in 0..width {
                    let u = (x as f32 + 0.5) / width as f32;
                    let mut rgb = pixel_at(src_data, width, channels, x, y);

                    if sharp != 0.0 {
                        let xl = x.saturating_sub(1);
                        let xr = (x + 1).min(width - 1);
                        let yu = y.saturating_sub(1);
                        let yd = (y + 1).min(height - 1);
                        let n = [
                            pixel_at(src_data, width, channels, xl, y),
                            pixel_at(src_data, width, channels, xr, y),
                            pixel_at(src_data, width, channels, x, yu),
                            pixel_at(src_data, width, channels, x, yd),
                        ];
                        for i in 0..3 {
                            let avg = (n[0][i] + n[1][i] + n[2][i] + n[3][i]) * 0.25;
                            rgb[i] += (rgb[i] - avg) * sharp;
                        }
                    }

                    let out = stack.evaluate(rgb, u, v);
                    let o = x as usize * channels;
                    row[o] = out[0];
                    row[o + 1] = out[1];
                    row[o + 2] = out[2];
                }
            });
    }

    let halation = adj.halation / 100.0;
    let bloom = if halation > 0.0 {
        Some(halation_bloom(&graded))
    } else {
        None
    };

    let grain = adj.grain_amount / 100.0;
    let vignette = adj.vignette_amount / 100.0;
    if bloom.is_none() && grain <= 0.0 && vignette == 0.0 {
        return graded;
    }

    // Stage 2: composite spatial effects.
    let mut out = graded.clone();
    let row_len = width as usize * channels;
    let graded_data = graded.data();
    let bloom_data = bloom.as_ref().map(|b| b.data());
    out.data_mut()
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as u32;
            let v = (y as f32 + 0.5) / height as f32;
            for x in 0..width {
                let u = (x as f32 + 0.5) / width as f32;
                let mut c = pixel_at(graded_data, width, channels, x, y);

                if let Some(bloom_data) = bloom_data {
                    let b = pixel_at(bloom_data, width, channels, x, y);
                    for i in 0..3 {
                        c[i] += b[i] * halation * HALATION_TINT[i];
                    }
                }

                if grain > 0.0 {
                    let cell_size = adj.grain_size.max(1.0);
                    let cell = [
                        (x as f32 / cell_size).floor(),
                        (y as f32 / cell_size).floor(),
                    ];
                    let noise =
                        hash12(cell[0] + opts.grain_seed, cell[1] + opts.grain_seed) - 0.5;
                    for ch in &mut c {
                        *ch += noise * grain * 0.2;
                    }
                }

                if vignette != 0.0 {
                    let du = u - 0.5;
                    let dv = v - 0.5;
                    let d = (du * du + dv * dv).sqrt() * 2.0;
                    let fall = smoothstep(adj.vignette_midpoint, adj.vignette_midpoint + 0.5, d);
                    for ch in &mut c {
                        *ch *= 1.0 - vignette * fall;
                    }
                }

                let o = x as usize * channels;
                row[o] = c[0].clamp(0.0, 1.0);
                row[o + 1] = c[1].clamp(0.0, 1.0);
                row[o + 2] = c[2].clamp(0.0, 1.0);
            }
        });
    out
}

/// Bright pass plus separable gaussian blur, matching the THRESHOLD
/// and BLUR kernels.
fn halation_bloom(graded: &ImageBuffer) -> ImageBuffer {
    let width = graded.width();
    let height = graded.height();
    let channels = graded.channels() as usize;
    let stride = (width / 512).max(1) as i64;

    let mut bright = graded.clone();
    for y in 0..height {
        for x in 0..width {
            let c = graded.pixel(x, y);
            let luma = c[0] * 0.2126 + c[1] * 0.7152 + c[2] * 0.0722;
            let knee = smoothstep(
                HALATION_THRESHOLD - HALATION_KNEE,
                HALATION_THRESHOLD + HALATION_KNEE,
                luma,
            );
            bright.set_pixel(x, y, [c[0] * knee, c[1] * knee, c[2] * knee]);
        }
    }

    let blur_pass = |src: &ImageBuffer, horizontal: bool| -> ImageBuffer {
        let mut dst = src.clone();
        let src_data = src.data();
        let row_len = width as usize * channels;
        dst.data_mut()
            .par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| {
                let y = y as u32;
                for x in 0..width {
                    let mut acc = [0.0f32; 3];
                    for k in -4i64..=4 {
                        let (sx, sy) = if horizontal {
                            (
                                (x as i64 + k * stride).clamp(0, width as i64 - 1) as u32,
                                y,
                            )
                        } else {
                            (
                                x,
                                (y as i64 + k * stride).clamp(0, height as i64 - 1) as u32,
                            )
                        };
                        let p = pixel_at(src_data, width, channels, sx, sy);
                        let w = BLUR_WEIGHTS[k.unsigned_abs() as usize];
                        for i in 0..3 {
                            acc[i] += p[i] * w;
                        }
                    }
                    let o = x as usize * channels;
                    row[o] = acc[0];
                    row[o + 1] = acc[1];
                    row[o + 2] = acc[2];
                }
            });
        dst
    };

    let h = blur_pass(&bright, true);
    blur_pass(&h, false)
}

#[inline]
fn pixel_at(data: &[f32], width: u32, channels: usize, x: u32, y: u32) -> [f32; 3] {
    let o = (y as usize * width as usize + x as usize) * channels;
    [data[o], data[o + 1], data[o + 2]]
}

#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Same 2D hash the composite kernel uses for grain.
#[inline]
fn hash12(x: f32, y: f32) -> f32 {
    let dot = x * 12.9898 + y * 78.233;
    let v = dot.sin() * 43758.5453;
    v - v.floor()
}
