//! # Control panel
//!
//! An imgui window over the scene, built from the parameter declarations.
//! [`UiManager`] bridges imgui to winit input and the wgpu frame;
//! [`parameter_panel`] lays out one folder per control group and routes
//! every edit through [`SceneState::set_param`](crate::scene::SceneState::set_param).
//!
//! While imgui wants the pointer or keyboard, camera input is suppressed.

pub mod manager;
pub mod panel;

pub use manager::UiManager;
pub use panel::parameter_panel;
