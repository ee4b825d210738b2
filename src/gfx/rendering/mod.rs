//! Frame rendering: surface setup, pipelines and instanced draws

pub mod instanced_renderer;
pub mod pipeline_manager;
pub mod render_engine;

use thiserror::Error;

pub use instanced_renderer::{collect_batches, InstanceData, InstancedRenderer};
pub use pipeline_manager::{PipelineConfig, PipelineError, PipelineManager};
pub use render_engine::RenderEngine;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to open GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported texture formats")]
    NoSurfaceFormat,
    #[error("failed to acquire surface texture: {0}")]
    SurfaceTexture(#[source] wgpu::SurfaceError),
    #[error("pipeline '{0}' is unavailable")]
    MissingPipeline(String),
}
