//! Device bring-up and compute pipeline creation.

use std::sync::Arc;

use tracing::info;

use crate::{GpuError, GpuResult};

/// Device, queue and the compiled compute pipelines.
pub struct GpuContext {
    pub(crate) device: Arc<wgpu::Device>,
    pub(crate) queue: Arc<wgpu::Queue>,
    pub(crate) pipelines: Pipelines,
    adapter_info: wgpu::AdapterInfo,
    /// Largest 2D dimension the device accepts.
    pub(crate) max_dim: u32,
}

/// One compute pipeline per kernel, auto bind-group layouts.
pub(crate) struct Pipelines {
    pub grade: wgpu::ComputePipeline,
    pub resize: wgpu::ComputePipeline,
    pub threshold: wgpu::ComputePipeline,
    pub blur_h: wgpu::ComputePipeline,
    pub blur_v: wgpu::ComputePipeline,
    pub composite: wgpu::ComputePipeline,
}

impl GpuContext {
    /// True when a compatible adapter exists.
    pub fn is_available() -> bool {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });
            instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .is_some()
        })
    }

    /// Brings up the device and compiles all pipelines.
    pub fn new() -> GpuResult<Self> {
        pollster::block_on(Self::new_async())
    }

    async fn new_async() -> GpuResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let adapter_limits = adapter.limits();
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("filmgrade_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter_limits.clone(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    ..Default::default()
                },
                None,
            )
            .await
            .map_err(|e| GpuError::DeviceCreation(e.to_string()))?;

        let adapter_info = adapter.get_info();
        info!(
            device = %adapter_info.name,
            backend = ?adapter_info.backend,
            "GPU context ready"
        );

        let pipelines = Pipelines::create(&device);

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            pipelines,
            max_dim: adapter_limits.max_texture_dimension_2d,
            adapter_info,
        })
    }

    /// Adapter info (GPU name, vendor, backend).
    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    /// Submits one encoder and blocks until the GPU is done.
    pub(crate) fn submit_and_wait(&self, encoder: wgpu::CommandEncoder) {
        self.queue.submit(std::iter::once(encoder.finish()));
        self.device.poll(wgpu::Maintain::Wait);
    }
}

impl Pipelines {
    fn create(device: &wgpu::Device) -> Self {
        let create = |source: &str, label: &str| -> wgpu::ComputePipeline {
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: None, // Auto layout
                module: &module,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                cache: None,
            })
        };

        use grade_ops::shaders;
        Self {
            grade: create(&shaders::grade_source(), "grade_pipeline"),
            resize: create(shaders::RESIZE, "resize_pipeline"),
            threshold: create(shaders::THRESHOLD, "threshold_pipeline"),
            blur_h: create(shaders::BLUR_H, "blur_h_pipeline"),
            blur_v: create(shaders::BLUR_V, "blur_v_pipeline"),
            composite: create(&shaders::composite_source(), "composite_pipeline"),
        }
    }
}

impl std::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext")
            .field("device", &self.adapter_info.name)
            .field("backend", &self.adapter_info.backend)
            .finish()
    }
}
