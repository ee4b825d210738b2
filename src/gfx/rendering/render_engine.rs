//! wgpu surface, device and the per-frame draw of the scene graph

use std::sync::Arc;

use log::{debug, info, warn};
use wgpu::util::DeviceExt;
use wgpu::{CompositeAlphaMode, Device, Queue, SurfaceCapabilities, TextureFormat};

use crate::gfx::{
    camera::camera_utils::CameraUniform, resources::texture_resource::TextureResource,
    scene::SceneGraph,
};

use super::instanced_renderer::InstancedRenderer;
use super::pipeline_manager::{PipelineConfig, PipelineManager};
use super::RenderError;

const NORMAL_PIPELINE: &str = "Normal";
const NORMAL_SHADER: &str = "normal";

const OPAQUE_BLACK: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

/// Owns the GPU context and draws the scene graph with the normal material
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<Device>,
    queue: Arc<Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    clear_color: wgpu::Color,
    pipelines: PipelineManager,
    camera: CameraBinding,
    instanced: InstancedRenderer,
}

struct CameraBinding {
    buffer: wgpu::Buffer,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl CameraBinding {
    fn new(device: &Device) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::bytes_of(&CameraUniform::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self {
            buffer,
            layout,
            bind_group,
        }
    }
}

/// First non-sRGB format; the normal shader writes display values directly
fn choose_format(formats: &[TextureFormat]) -> Option<TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|f| !f.is_srgb())
        .or_else(|| formats.first().copied())
}

/// Premultiplied alpha with a transparent clear, else the first mode and black
fn choose_alpha(modes: &[CompositeAlphaMode]) -> (CompositeAlphaMode, wgpu::Color) {
    if modes.contains(&CompositeAlphaMode::PreMultiplied) {
        (CompositeAlphaMode::PreMultiplied, wgpu::Color::TRANSPARENT)
    } else {
        let mode = modes.first().copied().unwrap_or(CompositeAlphaMode::Auto);
        (mode, OPAQUE_BLACK)
    }
}

fn surface_config(
    capabilities: &SurfaceCapabilities,
    width: u32,
    height: u32,
) -> Result<(wgpu::SurfaceConfiguration, wgpu::Color), RenderError> {
    let format = choose_format(&capabilities.formats).ok_or(RenderError::NoSurfaceFormat)?;
    let (alpha_mode, clear_color) = choose_alpha(&capabilities.alpha_modes);
    if alpha_mode != CompositeAlphaMode::PreMultiplied {
        debug!("Surface has no premultiplied alpha, clearing opaque");
    }

    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: width.max(1),
        height: height.max(1),
        present_mode: wgpu::PresentMode::Fifo,
        alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };
    Ok((config, clear_color))
}

impl RenderEngine {
    /// Initializes wgpu for `window` and compiles the normal pipeline
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<RenderEngine, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        info!("Using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("typescape device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let (config, clear_color) =
            surface_config(&surface.get_capabilities(&adapter), width, height)?;
        surface.configure(&device, &config);
        let depth_texture = TextureResource::create_depth_texture(&device, &config, "Scene Depth");
        let camera = CameraBinding::new(&device);

        let device: Arc<Device> = device.into();
        let mut pipelines = PipelineManager::new(device.clone());
        pipelines.load_shader(NORMAL_SHADER, include_str!("normal.wgsl"));
        // Text walls and shape faces are viewed from both sides while orbiting
        pipelines.register_pipeline(
            NORMAL_PIPELINE,
            PipelineConfig::new(NORMAL_SHADER, config.format)
                .with_label(NORMAL_PIPELINE)
                .with_cull_mode(None)
                .with_depth_format(TextureResource::DEPTH_FORMAT)
                .with_bind_group_layouts(vec![camera.layout.clone()]),
        );
        if let Err(errors) = pipelines.create_all_pipelines() {
            for e in errors {
                warn!("{e}");
            }
        }

        Ok(RenderEngine {
            surface,
            device,
            queue: queue.into(),
            config,
            depth_texture,
            clear_color,
            pipelines,
            camera,
            instanced: InstancedRenderer::new(),
        })
    }

    /// Next swapchain image, or None when this frame should be skipped
    fn acquire(&mut self) -> Result<Option<wgpu::SurfaceTexture>, RenderError> {
        match self.surface.get_current_texture() {
            Ok(texture) => Ok(Some(texture)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                debug!("Surface acquire timed out, skipping frame");
                Ok(None)
            }
            Err(e) => Err(RenderError::SurfaceTexture(e)),
        }
    }

    /// Draws `graph`, then lets `overlay` record on top of it
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped, as
    /// is a timed-out acquire; the overlay is not called for skipped frames.
    pub fn render_frame<F>(
        &mut self,
        graph: &SceneGraph,
        overlay: Option<F>,
    ) -> Result<(), RenderError>
    where
        F: FnOnce(&Device, &Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let Some(frame) = self.acquire()? else {
            return Ok(());
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.instanced.prepare(&self.device, &self.queue, graph);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let pipeline = self
                .pipelines
                .get_pipeline(NORMAL_PIPELINE)
                .ok_or_else(|| RenderError::MissingPipeline(NORMAL_PIPELINE.to_string()))?;

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &self.camera.bind_group, &[]);
            self.instanced.draw(&mut pass);
        }

        if let Some(overlay) = overlay {
            overlay(&self.device, &self.queue, &mut encoder, &view);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    pub fn render_frame_simple(&mut self, graph: &SceneGraph) -> Result<(), RenderError> {
        self.render_frame(
            graph,
            None::<fn(&Device, &Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView)>,
        )
    }

    pub fn render_frame_with_ui<F>(
        &mut self,
        graph: &SceneGraph,
        overlay: F,
    ) -> Result<(), RenderError>
    where
        F: FnOnce(&Device, &Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        self.render_frame(graph, Some(overlay))
    }

    /// Uploads the camera uniform for the next frame
    pub fn update(&mut self, camera_uniform: CameraUniform) {
        self.queue
            .write_buffer(&self.camera.buffer, 0, bytemuck::bytes_of(&camera_uniform));
    }

    /// Reconfigures the surface and depth buffer; zero sizes are ignored
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "Scene Depth");
        info!("Resized surface to {width}x{height}");
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> TextureFormat {
        self.config.format
    }
}
