//! GPU resources owned by the render engine

pub mod texture_resource;

pub use texture_resource::TextureResource;
