//! The compute renderer.
//!
//! # Overview
//!
//! Owns the GPU copies of the image (native resolution plus an optional
//! preview-scale working buffer) and runs the kernel sequence from
//! `grade_ops::shaders` over them:
//!
//! ```text
//! source --RESIZE--> preview --GRADE--> graded --THRESHOLD/BLUR--> bloom
//!                                          \                        /
//!                                           +------ COMPOSITE ----+--> output
//! ```
//!
//! # Staging contract
//!
//! [`Renderer::stage`] only records the snapshot; nothing reaches the
//! GPU until the next render commits it. Staging twice between renders
//! keeps the last snapshot (last write wins), and a failed render
//! leaves no partially-applied parameters behind because the commit is
//! a single struct swap on the CPU side.

use bytemuck::{Pod, Zeroable};
use tracing::{debug, warn};
use wgpu::util::DeviceExt;

use grade_core::{AdjustmentState, ImageBuffer, ImageSession, Mask};
use grade_lut::Lut3D;
use grade_ops::uniforms::{pack_masks, GlobalUniforms};

use crate::context::GpuContext;
use crate::state::{PipelineState, StateTracker};
use crate::{GpuError, GpuResult};

/// Dimensions uniform shared by the resize/threshold/blur kernels:
/// `[a, b, c, d]` with kernel-specific meaning.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct DimsUniform {
    dims: [u32; 4],
}

/// GPU-side RGBA f32 image.
struct GpuImage {
    buffer: wgpu::Buffer,
    width: u32,
    height: u32,
}

impl GpuImage {
    fn size_bytes(&self) -> u64 {
        self.width as u64 * self.height as u64 * 16
    }

    fn pixel_count(&self) -> u32 {
        self.width * self.height
    }
}

/// Everything one render is a function of, captured at stage time.
#[derive(Debug, Clone)]
pub struct RenderSnapshot {
    /// Global adjustments.
    pub adjustments: AdjustmentState,
    /// Masks in compositing order.
    pub masks: Vec<Mask>,
    /// Grain seed; fixed per snapshot so preview and export agree.
    pub grain_seed: f32,
}

impl RenderSnapshot {
    /// Captures a session's render-relevant state.
    pub fn from_session(session: &ImageSession, grain_seed: f32) -> Self {
        Self {
            adjustments: session.adjustments().clone(),
            masks: session.masks().to_vec(),
            grain_seed,
        }
    }
}

/// GPU renderer for one loaded image.
pub struct Renderer {
    ctx: GpuContext,
    tracker: StateTracker,

    source: Option<GpuImage>,
    preview: Option<GpuImage>,
    last_output: Option<GpuImage>,

    /// Native-resolution pixels kept for device-loss replay.
    cpu_copy: Option<ImageBuffer>,
    channels: u32,

    committed: RenderSnapshot,
    pending: Option<RenderSnapshot>,

    lut: Option<Lut3D>,
    lut_flat: Vec<f32>,
}

impl Renderer {
    /// True when a compatible adapter exists.
    pub fn is_available() -> bool {
        GpuContext::is_available()
    }

    /// Brings up the device and compiles all pipelines.
    pub fn new() -> GpuResult<Self> {
        Ok(Self {
            ctx: GpuContext::new()?,
            tracker: StateTracker::new(),
            source: None,
            preview: None,
            last_output: None,
            cpu_copy: None,
            channels: 4,
            committed: RenderSnapshot {
                adjustments: AdjustmentState::default(),
                masks: Vec::new(),
                grain_seed: 0.0,
            },
            pending: None,
            lut: None,
            lut_flat: Vec::new(),
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.tracker.state()
    }

    /// Uploads an image, replacing any previous one. The preview
    /// buffer is reset to native resolution.
    pub fn load_image(&mut self, image: &ImageBuffer) -> GpuResult<()> {
        let limit = self.ctx.max_dim;
        if image.width() > limit || image.height() > limit {
            return Err(GpuError::ImageTooLarge {
                width: image.width(),
                height: image.height(),
                limit,
            });
        }
        self.tracker.load_image()?;

        self.source = Some(self.upload_rgba(image));
        self.preview = None;
        self.last_output = None;
        self.channels = image.channels();
        self.cpu_copy = Some(image.clone());
        debug!(width = image.width(), height = image.height(), "image uploaded");
        Ok(())
    }

    /// Builds the preview-scale working buffer with the bilinear
    /// resize kernel. Pass the native size to render 1:1.
    pub fn set_preview_size(&mut self, width: u32, height: u32) -> GpuResult<()> {
        let source = self.source.as_ref().ok_or_else(|| {
            GpuError::InvalidState("set_preview_size before load_image".into())
        })?;
        if width == 0 || height == 0 {
            return Err(GpuError::InvalidState("preview size must be non-zero".into()));
        }
        if width == source.width && height == source.height {
            self.preview = None;
            return Ok(());
        }

        let dst = self.allocate(width, height);
        let dims = self.dims_uniform([width, height, source.width, source.height]);
        let bind = self.bind_entries(
            &self.ctx.pipelines.resize,
            &[
                source.buffer.as_entire_binding(),
                dst.buffer.as_entire_binding(),
                dims.as_entire_binding(),
            ],
            "resize_bind_group",
        );
        self.dispatch(&self.ctx.pipelines.resize, &bind, dst.pixel_count());
        self.preview = Some(dst);
        Ok(())
    }

    /// Stages a snapshot for the next render. Last write wins; nothing
    /// is committed until [`render`](Self::render) or
    /// [`render_highres`](Self::render_highres) runs.
    pub fn stage(&mut self, snapshot: RenderSnapshot) {
        self.pending = Some(snapshot);
    }

    /// Sets or clears the active LUT.
    pub fn set_lut(&mut self, lut: Option<Lut3D>) {
        self.lut_flat = lut.as_ref().map(Lut3D::flattened).unwrap_or_default();
        self.lut = lut;
    }

    /// Renders the preview-scale buffer and reads it back.
    pub fn render(&mut self) -> GpuResult<ImageBuffer> {
        self.tracker.begin_render()?;
        let result = self.render_inner(false);
        self.tracker.finish_render();
        if matches!(result, Err(GpuError::ContextLost)) {
            self.tracker.mark_lost();
        }
        result
    }

    /// Renders at native resolution with the same committed snapshot
    /// and kernel sequence as the preview path.
    pub fn render_highres(&mut self) -> GpuResult<ImageBuffer> {
        self.tracker.begin_render()?;
        let result = self.render_inner(true);
        self.tracker.finish_render();
        if matches!(result, Err(GpuError::ContextLost)) {
            self.tracker.mark_lost();
        }
        result
    }

    fn render_inner(&mut self, highres: bool) -> GpuResult<ImageBuffer> {
        // Commit: single swap, so a failure below never leaves a
        // half-applied parameter set.
        if let Some(snapshot) = self.pending.take() {
            self.committed = snapshot;
        }

        let src = if highres {
            self.source.as_ref()
        } else {
            self.preview.as_ref().or(self.source.as_ref())
        }
        .ok_or_else(|| GpuError::InvalidState("render before load_image".into()))?;

        let output = self.run_pipeline(src)?;
        let pixels = self.download(&output)?;
        let image = self.to_image_buffer(pixels, output.width, output.height)?;
        if !highres {
            self.last_output = Some(output);
        }
        Ok(image)
    }

    /// Executes the kernel sequence over `src`, returning the output
    /// buffer still on the GPU.
    fn run_pipeline(&self, src: &GpuImage) -> GpuResult<GpuImage> {
        let snap = &self.committed;
        let (mask_array, mask_count, raster_data) = pack_masks(&snap.masks);
        if snap.masks.iter().filter(|m| m.enabled).count() > mask_array.len() {
            warn!(cap = mask_array.len(), "mask count exceeds GPU cap, extra masks ignored");
        }

        let lut_size = self.lut.as_ref().map(|l| l.size as u32).unwrap_or(0);
        let globals = GlobalUniforms::new(
            src.width,
            src.height,
            &snap.adjustments,
            mask_count,
            lut_size,
            snap.grain_seed,
        );

        let device = &self.ctx.device;
        let globals_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals_uniform"),
            contents: bytemuck::bytes_of(&globals),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let masks_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("masks_buffer"),
            contents: bytemuck::cast_slice(&mask_array),
            usage: wgpu::BufferUsages::STORAGE,
        });
        // A LUT buffer must be bound even when no LUT is active; the
        // kernel never reads it then (lut size 0 in the uniforms).
        let lut_data: &[f32] = if self.lut_flat.is_empty() { &[0.0; 3] } else { &self.lut_flat };
        let lut_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lut_buffer"),
            contents: bytemuck::cast_slice(lut_data),
            usage: wgpu::BufferUsages::STORAGE,
        });
        // Same placeholder rule for painted mask rasters: the kernel
        // only reads them for entries with a non-zero raster size.
        let raster_slice: &[f32] = if raster_data.is_empty() { &[0.0] } else { &raster_data };
        let rasters_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mask_rasters_buffer"),
            contents: bytemuck::cast_slice(raster_slice),
            usage: wgpu::BufferUsages::STORAGE,
        });

        // Grade pass
        let graded = self.allocate(src.width, src.height);
        let bind = self.bind_entries(
            &self.ctx.pipelines.grade,
            &[
                src.buffer.as_entire_binding(),
                graded.buffer.as_entire_binding(),
                globals_buf.as_entire_binding(),
                masks_buf.as_entire_binding(),
                lut_buf.as_entire_binding(),
                rasters_buf.as_entire_binding(),
            ],
            "grade_bind_group",
        );
        self.dispatch(&self.ctx.pipelines.grade, &bind, graded.pixel_count());

        // Halation bright pass + separable blur, skipped when off.
        let bloom = if snap.adjustments.halation > 0.0 {
            let a = self.allocate(src.width, src.height);
            let b = self.allocate(src.width, src.height);
            let stride = (src.width / 512).max(1);

            let dims = self.dims_uniform([src.width, src.height, 0, 0]);
            let bind = self.bind_entries(
                &self.ctx.pipelines.threshold,
                &[
                    graded.buffer.as_entire_binding(),
                    a.buffer.as_entire_binding(),
                    dims.as_entire_binding(),
                ],
                "threshold_bind_group",
            );
            self.dispatch(&self.ctx.pipelines.threshold, &bind, a.pixel_count());

            let dims = self.dims_uniform([src.width, src.height, stride, 0]);
            let bind = self.bind_entries(
                &self.ctx.pipelines.blur_h,
                &[
                    a.buffer.as_entire_binding(),
                    b.buffer.as_entire_binding(),
                    dims.as_entire_binding(),
                ],
                "blur_h_bind_group",
            );
            self.dispatch(&self.ctx.pipelines.blur_h, &bind, b.pixel_count());

            let bind = self.bind_entries(
                &self.ctx.pipelines.blur_v,
                &[
                    b.buffer.as_entire_binding(),
                    a.buffer.as_entire_binding(),
                    dims.as_entire_binding(),
                ],
                "blur_v_bind_group",
            );
            self.dispatch(&self.ctx.pipelines.blur_v, &bind, a.pixel_count());
            Some(a)
        } else {
            None
        };

        // Composite pass always runs: grain, vignette, final clamp.
        let output = self.allocate(src.width, src.height);
        let bloom_binding = bloom
            .as_ref()
            .map(|b| b.buffer.as_entire_binding())
            .unwrap_or_else(|| graded.buffer.as_entire_binding());
        let bind = self.bind_entries(
            &self.ctx.pipelines.composite,
            &[
                graded.buffer.as_entire_binding(),
                bloom_binding,
                output.buffer.as_entire_binding(),
                globals_buf.as_entire_binding(),
            ],
            "composite_bind_group",
        );
        self.dispatch(&self.ctx.pipelines.composite, &bind, output.pixel_count());

        Ok(output)
    }

    /// Reads back a rectangle from the last preview render.
    pub fn read_pixels(&self, x: u32, y: u32, width: u32, height: u32) -> GpuResult<ImageBuffer> {
        if self.tracker.state() == PipelineState::Lost {
            return Err(GpuError::ContextLost);
        }
        let output = self
            .last_output
            .as_ref()
            .ok_or_else(|| GpuError::InvalidState("read_pixels before render".into()))?;
        if x + width > output.width || y + height > output.height {
            return Err(GpuError::InvalidState(format!(
                "region {width}x{height}+{x}+{y} outside {}x{}",
                output.width, output.height
            )));
        }

        let row_bytes = width as u64 * 16;
        let staging = self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("region_staging"),
            size: row_bytes * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self.ctx.device.create_command_encoder(&Default::default());
        for row in 0..height {
            let src_offset = ((y + row) as u64 * output.width as u64 + x as u64) * 16;
            encoder.copy_buffer_to_buffer(
                &output.buffer,
                src_offset,
                &staging,
                row as u64 * row_bytes,
                row_bytes,
            );
        }
        self.ctx.submit_and_wait(encoder);

        let pixels = Self::map_staging(&self.ctx, &staging)?;
        self.to_image_buffer(pixels, width, height)
    }

    /// Rebuilds the device and replays the loaded image after a
    /// context loss. The committed snapshot and LUT survive as-is.
    pub fn recover(&mut self) -> GpuResult<()> {
        if self.tracker.state() != PipelineState::Lost {
            return Err(GpuError::InvalidState("recover called without context loss".into()));
        }
        warn!("rebuilding GPU context after loss");

        self.ctx = GpuContext::new()?;
        self.last_output = None;
        self.preview = None;
        self.source = self.cpu_copy.as_ref().map(|img| self.upload_rgba(img));
        self.tracker.recover(self.source.is_some());
        Ok(())
    }

    /// Forces the lost state. Intended for hosts that learn about
    /// device loss through their own callbacks.
    pub fn mark_lost(&mut self) {
        self.tracker.mark_lost();
    }

    // --- plumbing -------------------------------------------------------

    fn upload_rgba(&self, image: &ImageBuffer) -> GpuImage {
        let rgba = to_rgba(image);
        let buffer = self.ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("image_buffer"),
            contents: bytemuck::cast_slice(&rgba),
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
        });
        GpuImage { buffer, width: image.width(), height: image.height() }
    }

    fn allocate(&self, width: u32, height: u32) -> GpuImage {
        let buffer = self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("work_buffer"),
            size: width as u64 * height as u64 * 16,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        GpuImage { buffer, width, height }
    }

    fn dims_uniform(&self, dims: [u32; 4]) -> wgpu::Buffer {
        self.ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("dims_uniform"),
            contents: bytemuck::bytes_of(&DimsUniform { dims }),
            usage: wgpu::BufferUsages::UNIFORM,
        })
    }

    fn bind_entries(
        &self,
        pipeline: &wgpu::ComputePipeline,
        resources: &[wgpu::BindingResource],
        label: &str,
    ) -> wgpu::BindGroup {
        let layout = pipeline.get_bind_group_layout(0);
        let entries: Vec<wgpu::BindGroupEntry> = resources
            .iter()
            .enumerate()
            .map(|(i, r)| wgpu::BindGroupEntry { binding: i as u32, resource: r.clone() })
            .collect();
        self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &layout,
            entries: &entries,
        })
    }

    fn dispatch(&self, pipeline: &wgpu::ComputePipeline, bind_group: &wgpu::BindGroup, pixels: u32) {
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("compute_encoder") });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("compute_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.dispatch_workgroups(pixels.div_ceil(256), 1, 1);
        }
        self.ctx.submit_and_wait(encoder);
    }

    fn download(&self, image: &GpuImage) -> GpuResult<Vec<f32>> {
        let staging = self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging_buffer"),
            size: image.size_bytes(),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self.ctx.device.create_command_encoder(&Default::default());
        encoder.copy_buffer_to_buffer(&image.buffer, 0, &staging, 0, image.size_bytes());
        self.ctx.submit_and_wait(encoder);

        Self::map_staging(&self.ctx, &staging)
    }

    fn map_staging(ctx: &GpuContext, staging: &wgpu::Buffer) -> GpuResult<Vec<f32>> {
        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        ctx.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|_| GpuError::ContextLost)?
            .map_err(|e| GpuError::Readback(e.to_string()))?;

        let data = slice.get_mapped_range();
        let result: Vec<f32> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        staging.unmap();
        Ok(result)
    }

    /// Converts downloaded RGBA floats back into the loaded image's
    /// channel layout.
    fn to_image_buffer(&self, rgba: Vec<f32>, width: u32, height: u32) -> GpuResult<ImageBuffer> {
        let data = if self.channels == 4 {
            rgba
        } else {
            let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
            for px in rgba.chunks_exact(4) {
                rgb.extend_from_slice(&px[..3]);
            }
            rgb
        };
        ImageBuffer::from_data(data, width, height, self.channels)
            .map_err(|e| GpuError::Render(e.to_string()))
    }
}

/// Interleaves to RGBA with opaque alpha when the source is RGB.
fn to_rgba(image: &ImageBuffer) -> Vec<f32> {
    if image.channels() == 4 {
        return image.data().to_vec();
    }
    let mut out = Vec::with_capacity(image.data().len() / 3 * 4);
    for px in image.data().chunks_exact(3) {
        out.extend_from_slice(px);
        out.push(1.0);
    }
    out
}
