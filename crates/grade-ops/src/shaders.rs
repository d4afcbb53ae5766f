//! WGSL compute kernels for the render pipeline.
//!
//! All kernels operate on planar f32 storage buffers in `workgroup_size(256)`
//! 1D dispatches, one invocation per pixel. The color math here mirrors
//! [`chain`](crate::chain) and [`cpu`](crate::cpu) line for line; the two
//! paths must agree within float rounding. The struct layouts match the
//! Pod types in [`uniforms`](crate::uniforms).
//!
//! Pipeline order per frame:
//!
//! 1. [`GRADE`] - sharpen, color chain, masks, LUT blend
//! 2. [`THRESHOLD`] + [`BLUR_H`] + [`BLUR_V`] - halation bright pass
//!    (skipped when halation is zero)
//! 3. [`COMPOSITE`] - halation add, grain, vignette, final clamp
//!
//! [`RESIZE`] runs once per zoom change to produce the preview-scale
//! working buffer.

/// Luminance threshold where the halation bright pass starts to pick up.
pub const HALATION_THRESHOLD: f32 = 0.75;
/// Soft knee width around [`HALATION_THRESHOLD`].
pub const HALATION_KNEE: f32 = 0.15;

/// Shared WGSL prelude: uniform structs and the per-color grade chain.
const COMMON: &str = r#"
struct GradeParams {
    exposure: f32,
    temperature: f32,
    tint: f32,
    contrast: f32,
    saturation: f32,
    vibrance: f32,
    shadows: f32,
    highlights: f32,
    whites: f32,
    blacks: f32,
    clarity: f32,
    dehaze: f32,
    fade: f32,
    lut_intensity: f32,
    _pad0: f32,
    _pad1: f32,
}

struct Globals {
    dims: vec4<u32>,     // w, h, mask count, lut size (0 = none)
    grade: GradeParams,
    effects: vec4<f32>,  // grain amount, grain size, vignette amount, vignette midpoint
    misc: vec4<f32>,     // halation, grain seed, aspect, sharpness
}

const LUMA: vec3<f32> = vec3<f32>(0.2126, 0.7152, 0.0722);

fn soft_step(e0: f32, e1: f32, x: f32) -> f32 {
    if e1 <= e0 { return step(e0, x); }
    let t = clamp((x - e0) / (e1 - e0), 0.0, 1.0);
    return t * t * (3.0 - 2.0 * t);
}

fn grade_color(rgb: vec3<f32>, p: GradeParams) -> vec3<f32> {
    var c = rgb;

    // Exposure
    if p.exposure != 0.0 {
        c = c * exp2(p.exposure);
    }

    // Temperature / tint
    if p.temperature != 0.0 {
        let t = p.temperature / 100.0;
        c.r += t * 0.1;
        c.b -= t * 0.1;
    }
    if p.tint != 0.0 {
        let t = p.tint / 100.0;
        c.g -= t * 0.1;
        c.r += t * 0.05;
        c.b += t * 0.05;
    }

    // Contrast
    if p.contrast != 0.0 {
        let k = 1.0 + p.contrast / 100.0;
        c = (c - 0.5) * k + 0.5;
    }

    // Saturation
    if p.saturation != 0.0 {
        let k = 1.0 + p.saturation / 100.0;
        let l = dot(c, LUMA);
        c = vec3<f32>(l) + (c - vec3<f32>(l)) * k;
    }

    // Vibrance
    if p.vibrance != 0.0 {
        let v = p.vibrance / 100.0;
        let max_c = max(c.r, max(c.g, c.b));
        let min_c = min(c.r, min(c.g, c.b));
        let sat_level = (max_c - min_c) / (max_c + 0.001);
        let k = 1.0 + v * (1.0 - sat_level);
        let l = dot(c, LUMA);
        c = vec3<f32>(l) + (c - vec3<f32>(l)) * k;
    }

    // Shadows / highlights
    if p.shadows != 0.0 || p.highlights != 0.0 {
        let l = dot(c, LUMA);
        let shadow_mask = 1.0 - min(2.0 * l, 1.0);
        let highlight_mask = max(2.0 * l - 1.0, 0.0);
        let lift = p.shadows / 100.0 * 0.2 * shadow_mask
                 + p.highlights / 100.0 * 0.2 * highlight_mask;
        c += vec3<f32>(lift);
    }

    // Whites / blacks
    if p.whites != 0.0 || p.blacks != 0.0 {
        let l = dot(c, LUMA);
        let white_mask = soft_step(0.75, 1.0, l);
        let black_mask = 1.0 - soft_step(0.0, 0.25, l);
        let w = p.whites / 100.0 * white_mask;
        let b = p.blacks / 100.0 * black_mask;
        c = c + c * w + vec3<f32>(b * 0.2);
    }

    // Clarity
    if p.clarity != 0.0 {
        let l = dot(c, LUMA);
        let m = max(1.0 - abs(l - 0.5) * 2.0, 0.0);
        let k = 1.0 + p.clarity / 100.0 * m * m * 0.5;
        c = (c - 0.5) * k + 0.5;
    }

    // Dehaze
    if p.dehaze != 0.0 {
        let d = p.dehaze / 100.0;
        let haze = clamp(min(c.r, min(c.g, c.b)), 0.0, 1.0);
        let transmission = max(1.0 - d * haze, 0.1);
        let recovered = clamp((c - vec3<f32>(1.0 - transmission)) / transmission,
                              vec3<f32>(0.0), vec3<f32>(1.0));
        c = mix(c, recovered, abs(d));
    }

    // Fade
    if p.fade != 0.0 {
        let f = p.fade / 100.0;
        c = c * (1.0 - f * 0.3) + vec3<f32>(f * 0.1);
    }

    return c;
}
"#;

/// Kernel-specific body for the grade pass.
const GRADE_BODY: &str = r#"
struct MaskUniform {
    kind: u32,      // 0 = empty, 1 = radial, 2 = linear
    invert: u32,
    feather: f32,
    raster_offset: u32,
    point_a: vec2<f32>,
    point_b: vec2<f32>,
    raster_size: vec2<u32>,  // 0,0 = purely geometric
    _pad0: vec2<u32>,
    grade: GradeParams,
}

@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> globals: Globals;
@group(0) @binding(3) var<storage, read> masks: array<MaskUniform>;
@group(0) @binding(4) var<storage, read> lut: array<f32>;
@group(0) @binding(5) var<storage, read> rasters: array<f32>;

// Bilinear sample of a painted raster, edge-clamped. Same math as the
// CPU side.
fn raster_coverage(m: MaskUniform, uv: vec2<f32>) -> f32 {
    let rw = m.raster_size.x;
    let rh = m.raster_size.y;
    let x = clamp(uv.x, 0.0, 1.0) * f32(rw - 1u);
    let y = clamp(uv.y, 0.0, 1.0) * f32(rh - 1u);
    let x0 = u32(floor(x));
    let y0 = u32(floor(y));
    let x1 = min(x0 + 1u, rw - 1u);
    let y1 = min(y0 + 1u, rh - 1u);
    let fx = x - f32(x0);
    let fy = y - f32(y0);
    let row0 = m.raster_offset + y0 * rw;
    let row1 = m.raster_offset + y1 * rw;
    let top = mix(rasters[row0 + x0], rasters[row0 + x1], fx);
    let bot = mix(rasters[row1 + x0], rasters[row1 + x1], fx);
    return mix(top, bot, fy);
}

fn mask_coverage(m: MaskUniform, uv: vec2<f32>, aspect: f32) -> f32 {
    var c = 0.0;
    if m.raster_size.x > 0u {
        // A painted raster replaces the geometric falloff entirely.
        c = clamp(raster_coverage(m, uv), 0.0, 1.0);
    } else {
        let f = clamp(m.feather, 0.0, 1.0);
        var t = 0.0;
        if m.kind == 1u {
            let p = vec2<f32>(uv.x * aspect, uv.y);
            let ce = vec2<f32>(m.point_a.x * aspect, m.point_a.y);
            let r = vec2<f32>(m.point_b.x * aspect, m.point_b.y);
            t = distance(p, ce) / max(distance(ce, r), 1e-4);
        } else {
            let s = vec2<f32>(m.point_a.x * aspect, m.point_a.y);
            let e = vec2<f32>(m.point_b.x * aspect, m.point_b.y);
            let axis = e - s;
            let len = max(length(axis), 1e-4);
            t = dot(vec2<f32>(uv.x * aspect, uv.y) - s, axis / len) / len;
        }
        c = clamp(1.0 - soft_step(1.0 - f, 1.0 + f, t), 0.0, 1.0);
    }
    if m.invert == 1u { c = 1.0 - c; }
    return c;
}

fn lut_apply(rgb: vec3<f32>, size: u32) -> vec3<f32> {
    let n = f32(size - 1u);
    let pos = clamp(rgb, vec3<f32>(0.0), vec3<f32>(1.0)) * n;
    let i0 = min(vec3<u32>(floor(pos)), vec3<u32>(size - 2u));
    let f = pos - vec3<f32>(i0);

    let s = size;
    let stride_g = s;
    let stride_b = s * s;

    var out = vec3<f32>(0.0);
    for (var corner = 0u; corner < 8u; corner++) {
        let dr = corner & 1u;
        let dg = (corner >> 1u) & 1u;
        let db = (corner >> 2u) & 1u;
        let idx = ((i0.x + dr) + stride_g * (i0.y + dg) + stride_b * (i0.z + db)) * 3u;
        let w = mix(1.0 - f.x, f.x, f32(dr))
              * mix(1.0 - f.y, f.y, f32(dg))
              * mix(1.0 - f.z, f.z, f32(db));
        out += vec3<f32>(lut[idx], lut[idx + 1u], lut[idx + 2u]) * w;
    }
    return out;
}

fn load_rgb(px: u32) -> vec3<f32> {
    let base = px * 4u;
    return vec3<f32>(src[base], src[base + 1u], src[base + 2u]);
}

@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let px = id.x;
    let w = globals.dims.x;
    let h = globals.dims.y;
    if px >= w * h { return; }

    let x = px % w;
    let y = px / w;
    let uv = vec2<f32>((f32(x) + 0.5) / f32(w), (f32(y) + 0.5) / f32(h));
    let aspect = globals.misc.z;

    var rgb = load_rgb(px);

    // Unsharp mask against the 4-neighbor average of the source.
    let sharp = globals.misc.w / 100.0;
    if sharp != 0.0 {
        let xl = select(x, x - 1u, x > 0u);
        let xr = min(x + 1u, w - 1u);
        let yu = select(y, y - 1u, y > 0u);
        let yd = min(y + 1u, h - 1u);
        let avg = (load_rgb(y * w + xl) + load_rgb(y * w + xr)
                 + load_rgb(yu * w + x) + load_rgb(yd * w + x)) * 0.25;
        rgb += (rgb - avg) * sharp;
    }

    var out = grade_color(rgb, globals.grade);

    // Local masks, composited in list order against the source pixel.
    let n_masks = globals.dims.z;
    for (var i = 0u; i < n_masks; i++) {
        let coverage = mask_coverage(masks[i], uv, aspect);
        if coverage > 0.0 {
            let local = grade_color(rgb, masks[i].grade);
            out = mix(out, local, coverage);
        }
    }

    // LUT blend
    let lut_size = globals.dims.w;
    if lut_size > 0u && globals.grade.lut_intensity > 0.0 {
        out = mix(out, lut_apply(out, lut_size), globals.grade.lut_intensity);
    }

    out = clamp(out, vec3<f32>(0.0), vec3<f32>(1.0));
    let base = px * 4u;
    dst[base] = out.r;
    dst[base + 1u] = out.g;
    dst[base + 2u] = out.b;
    dst[base + 3u] = src[base + 3u];
}
"#;

/// Bilinear resize between two RGBA buffers.
pub const RESIZE: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // dst w, dst h, src w, src h

fn load(px: u32, ch: u32) -> f32 {
    return src[px * 4u + ch];
}

@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let px = id.x;
    let dw = dims.x;
    let dh = dims.y;
    if px >= dw * dh { return; }

    let sw = dims.z;
    let sh = dims.w;

    let dx = px % dw;
    let dy = px / dw;

    let sx = (f32(dx) + 0.5) / f32(dw) * f32(sw) - 0.5;
    let sy = (f32(dy) + 0.5) / f32(dh) * f32(sh) - 0.5;

    let x0 = u32(clamp(floor(sx), 0.0, f32(sw - 1u)));
    let y0 = u32(clamp(floor(sy), 0.0, f32(sh - 1u)));
    let x1 = min(x0 + 1u, sw - 1u);
    let y1 = min(y0 + 1u, sh - 1u);
    let fx = clamp(sx - f32(x0), 0.0, 1.0);
    let fy = clamp(sy - f32(y0), 0.0, 1.0);

    let base = px * 4u;
    for (var ch = 0u; ch < 4u; ch++) {
        let top = mix(load(y0 * sw + x0, ch), load(y0 * sw + x1, ch), fx);
        let bot = mix(load(y1 * sw + x0, ch), load(y1 * sw + x1, ch), fx);
        dst[base + ch] = mix(top, bot, fy);
    }
}
"#;

/// Halation bright pass: soft-knee threshold on luminance.
pub const THRESHOLD: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // w, h, 0, 0

@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let px = id.x;
    if px >= dims.x * dims.y { return; }

    let base = px * 4u;
    let rgb = vec3<f32>(src[base], src[base + 1u], src[base + 2u]);
    let luma = dot(rgb, vec3<f32>(0.2126, 0.7152, 0.0722));
    let knee = smoothstep(0.6, 0.9, luma);

    dst[base] = rgb.r * knee;
    dst[base + 1u] = rgb.g * knee;
    dst[base + 2u] = rgb.b * knee;
    dst[base + 3u] = 1.0;
}
"#;

/// Horizontal pass of the separable halation blur (9-tap gaussian).
pub const BLUR_H: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // w, h, stride, 0

@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let px = id.x;
    let w = dims.x;
    let h = dims.y;
    if px >= w * h { return; }

    let x = i32(px % w);
    let y = px / w;
    let stride = i32(max(dims.z, 1u));

    var weights = array<f32, 5>(0.227027, 0.194595, 0.121622, 0.054054, 0.016216);
    var acc = vec3<f32>(0.0);
    for (var k = -4; k <= 4; k++) {
        let sx = u32(clamp(x + k * stride, 0, i32(w) - 1));
        let base = (y * w + sx) * 4u;
        acc += vec3<f32>(src[base], src[base + 1u], src[base + 2u]) * weights[abs(k)];
    }

    let base = px * 4u;
    dst[base] = acc.r;
    dst[base + 1u] = acc.g;
    dst[base + 2u] = acc.b;
    dst[base + 3u] = 1.0;
}
"#;

/// Vertical pass of the separable halation blur.
pub const BLUR_V: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // w, h, stride, 0

@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let px = id.x;
    let w = dims.x;
    let h = dims.y;
    if px >= w * h { return; }

    let x = px % w;
    let y = i32(px / w);
    let stride = i32(max(dims.z, 1u));

    var weights = array<f32, 5>(0.227027, 0.194595, 0.121622, 0.054054, 0.016216);
    var acc = vec3<f32>(0.0);
    for (var k = -4; k <= 4; k++) {
        let sy = u32(clamp(y + k * stride, 0, i32(h) - 1));
        let base = (sy * w + x) * 4u;
        acc += vec3<f32>(src[base], src[base + 1u], src[base + 2u]) * weights[abs(k)];
    }

    let base = px * 4u;
    dst[base] = acc.r;
    dst[base + 1u] = acc.g;
    dst[base + 2u] = acc.b;
    dst[base + 3u] = 1.0;
}
"#;

/// Composite body: halation add, grain, vignette, final clamp.
const COMPOSITE_BODY: &str = r#"
@group(0) @binding(0) var<storage, read> graded: array<f32>;
@group(0) @binding(1) var<storage, read> halation: array<f32>;
@group(0) @binding(2) var<storage, read_write> dst: array<f32>;
@group(0) @binding(3) var<uniform> globals: Globals;

fn hash12(p: vec2<f32>) -> f32 {
    return fract(sin(dot(p, vec2<f32>(12.9898, 78.233))) * 43758.5453);
}

@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let px = id.x;
    let w = globals.dims.x;
    let h = globals.dims.y;
    if px >= w * h { return; }

    let x = px % w;
    let y = px / w;
    let uv = vec2<f32>((f32(x) + 0.5) / f32(w), (f32(y) + 0.5) / f32(h));

    let base = px * 4u;
    var c = vec3<f32>(graded[base], graded[base + 1u], graded[base + 2u]);

    // Halation: tinted additive bloom.
    let hal = globals.misc.x / 100.0;
    if hal > 0.0 {
        let bloom = vec3<f32>(halation[base], halation[base + 1u], halation[base + 2u]);
        c += bloom * hal * vec3<f32>(1.0, 0.6, 0.35);
    }

    // Grain: seeded hash noise on a cell grid.
    let grain = globals.effects.x / 100.0;
    if grain > 0.0 {
        let cell_size = max(globals.effects.y, 1.0);
        let cell = floor(vec2<f32>(f32(x), f32(y)) / cell_size);
        let noise = hash12(cell + vec2<f32>(globals.misc.y)) - 0.5;
        c += vec3<f32>(noise * grain * 0.2);
    }

    // Vignette
    let vig = globals.effects.z / 100.0;
    if vig != 0.0 {
        let mid = globals.effects.w;
        let d = length(uv - vec2<f32>(0.5)) * 2.0;
        let fall = smoothstep(mid, mid + 0.5, d);
        c *= 1.0 - vig * fall;
    }

    c = clamp(c, vec3<f32>(0.0), vec3<f32>(1.0));
    dst[base] = c.r;
    dst[base + 1u] = c.g;
    dst[base + 2u] = c.b;
    dst[base + 3u] = graded[base + 3u];
}
"#;

/// Full source of the grade kernel (prelude + body).
pub fn grade_source() -> String {
    format!("{COMMON}\n{GRADE_BODY}")
}

/// Full source of the composite kernel (prelude + body).
pub fn composite_source() -> String {
    format!("{COMMON}\n{COMPOSITE_BODY}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembled_sources_contain_entry_points() {
        for src in [grade_source(), composite_source()] {
            assert!(src.contains("struct Globals"));
            assert!(src.contains("fn main"));
            assert_eq!(src.matches("@compute").count(), 1);
        }
    }

    #[test]
    fn standalone_kernels_are_self_contained() {
        for src in [RESIZE, THRESHOLD, BLUR_H, BLUR_V] {
            assert!(src.contains("@compute @workgroup_size(256)"));
            assert!(src.contains("@binding(0)"));
        }
    }
}
