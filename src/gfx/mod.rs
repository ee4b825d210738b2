//! # Graphics
//!
//! Everything between scene state and pixels.
//!
//! - [`camera`]: orbit camera, damped controls and the intro tween
//! - [`geometry`]: procedural primitives, typeface parsing and text extrusion
//! - [`scene`]: the scene graph of geometry handles and transformed nodes
//! - [`rendering`]: wgpu setup and instanced drawing of the graph
//! - [`resources`]: GPU attachments owned by the renderer

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;

pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
