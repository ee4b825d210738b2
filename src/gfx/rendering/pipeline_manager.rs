//! Render pipeline registry with lazy creation
//!
//! Pipelines are described by a [`PipelineConfig`] up front and only compiled
//! the first time they are requested.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};
use thiserror::Error;
use wgpu::*;

use crate::gfx::rendering::instanced_renderer::InstanceData;
use crate::gfx::scene::vertex::Vertex3D;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("shader '{0}' has not been loaded")]
    MissingShader(String),
    #[error("pipeline '{0}' is not registered")]
    UnknownPipeline(String),
}

/// Everything needed to build one mesh pipeline
///
/// Vertex input is always a [`Vertex3D`] stream plus per-instance
/// [`InstanceData`]; shaders must expose `vs_main` and `fs_main`.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub shader: String,
    pub bind_group_layouts: Vec<BindGroupLayout>,
    pub cull_mode: Option<Face>,
    pub depth_format: Option<TextureFormat>,
    pub color_target: ColorTargetState,
}

impl PipelineConfig {
    /// Opaque triangles into `color_format`, back faces culled, no depth
    pub fn new(shader: &str, color_format: TextureFormat) -> Self {
        Self {
            label: format!("{shader} pipeline"),
            shader: shader.to_string(),
            bind_group_layouts: Vec::new(),
            cull_mode: Some(Face::Back),
            depth_format: None,
            color_target: ColorTargetState {
                format: color_format,
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            },
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    pub fn with_cull_mode(mut self, face: Option<Face>) -> Self {
        self.cull_mode = face;
        self
    }

    pub fn with_bind_group_layouts(mut self, layouts: Vec<BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }

    /// Enables depth testing against an attachment of `format`
    pub fn with_depth_format(mut self, format: TextureFormat) -> Self {
        self.depth_format = Some(format);
        self
    }

    fn vertex_layouts() -> [VertexBufferLayout<'static>; 2] {
        [Vertex3D::desc(), InstanceData::desc()]
    }
}

/// Caches compiled shaders and pipelines by name
pub struct PipelineManager {
    device: Arc<Device>,
    shaders: HashMap<String, ShaderModule>,
    configs: HashMap<String, PipelineConfig>,
    built: HashMap<String, RenderPipeline>,
}

impl PipelineManager {
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            shaders: HashMap::new(),
            configs: HashMap::new(),
            built: HashMap::new(),
        }
    }

    pub fn load_shader(&mut self, name: &str, source: &str) {
        let module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });
        self.shaders.insert(name.to_string(), module);
        debug!("Loaded shader '{name}'");
    }

    /// Registers a configuration; re-registering drops the built pipeline
    pub fn register_pipeline(&mut self, name: &str, config: PipelineConfig) {
        self.built.remove(name);
        self.configs.insert(name.to_string(), config);
    }

    /// Registered but not yet compiled
    pub fn is_pending(&self, name: &str) -> bool {
        self.configs.contains_key(name) && !self.built.contains_key(name)
    }

    /// Returns the named pipeline, compiling it on first request
    pub fn get_pipeline(&mut self, name: &str) -> Option<&RenderPipeline> {
        if self.is_pending(name) {
            if let Err(e) = self.build(name) {
                warn!("Failed to create pipeline '{name}': {e}");
                return None;
            }
        }
        self.built.get(name)
    }

    /// Already-compiled pipeline, without trying to build it
    pub fn pipeline(&self, name: &str) -> Option<&RenderPipeline> {
        self.built.get(name)
    }

    /// Compiles every pending pipeline, collecting failures
    pub fn create_all_pipelines(&mut self) -> Result<(), Vec<PipelineError>> {
        let pending: Vec<String> = self
            .configs
            .keys()
            .filter(|name| !self.built.contains_key(*name))
            .cloned()
            .collect();
        let errors: Vec<PipelineError> = pending
            .iter()
            .filter_map(|name| self.build(name).err())
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn build(&mut self, name: &str) -> Result<(), PipelineError> {
        let config = self
            .configs
            .get(name)
            .ok_or_else(|| PipelineError::UnknownPipeline(name.to_string()))?;
        let shader = self
            .shaders
            .get(&config.shader)
            .ok_or_else(|| PipelineError::MissingShader(config.shader.clone()))?;

        let layouts: Vec<&BindGroupLayout> = config.bind_group_layouts.iter().collect();
        let layout = self
            .device
            .create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some(&format!("{} Layout", config.label)),
                bind_group_layouts: &layouts,
                push_constant_ranges: &[],
            });

        let vertex_layouts = PipelineConfig::vertex_layouts();
        let targets = [Some(config.color_target.clone())];
        let pipeline = self
            .device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(&config.label),
                layout: Some(&layout),
                vertex: VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &vertex_layouts,
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment: Some(FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    targets: &targets,
                    compilation_options: PipelineCompilationOptions::default(),
                }),
                primitive: PrimitiveState {
                    topology: PrimitiveTopology::TriangleList,
                    cull_mode: config.cull_mode,
                    ..Default::default()
                },
                depth_stencil: config.depth_format.map(|format| DepthStencilState {
                    format,
                    depth_write_enabled: true,
                    depth_compare: CompareFunction::Less,
                    stencil: StencilState::default(),
                    bias: DepthBiasState::default(),
                }),
                multisample: MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        debug!("Built pipeline '{name}'");
        self.built.insert(name.to_string(), pipeline);
        Ok(())
    }
}
