use std::time::Duration;

use cgmath::{Matrix4, SquareMatrix, Vector3, Zero};
use winit::event::{DeviceEvent, KeyEvent};

use super::{
    camera_controller::CameraController,
    orbit_camera::OrbitCamera,
    tween::{Easing, Vector3Tween},
};

/// Camera, its controller, and the optional intro fly-in
pub struct CameraManager {
    pub camera: OrbitCamera,
    pub controller: CameraController,
    intro: Option<Vector3Tween>,
}

impl CameraManager {
    pub fn new(camera: OrbitCamera, controller: CameraController) -> Self {
        Self {
            camera,
            controller,
            intro: None,
        }
    }

    pub fn process_event(&mut self, event: &DeviceEvent) {
        self.controller.process_events(event);
    }

    pub fn process_keyboard_event(&mut self, event: &KeyEvent) {
        self.controller.process_keyed_events(event);
    }

    /// Starts easing the eye from `offset` back onto the orbit
    pub fn start_intro(&mut self, offset: Vector3<f32>, duration: Duration, easing: Easing) {
        self.camera.set_offset(offset);
        self.intro = Some(Vector3Tween::new(offset, Vector3::zero(), duration, easing));
    }

    pub fn intro_active(&self) -> bool {
        self.intro.is_some()
    }

    /// Advances the intro and damping, then refreshes the uniform
    pub fn update(&mut self, dt: Duration) {
        if let Some(tween) = &mut self.intro {
            let offset = tween.advance(dt);
            self.camera.set_offset(offset);
            if tween.is_finished() {
                self.intro = None;
            }
        }
        self.controller.update(&mut self.camera);
        self.camera.update_view_proj();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.resize_projection(width, height);
    }

    pub fn uniform(&self) -> CameraUniform {
        self.camera.uniform
    }
}

pub trait Camera: Sized {
    fn build_view_matrix(&self) -> Matrix4<f32>;

    fn build_projection_matrix(&self) -> Matrix4<f32>;

    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        self.build_projection_matrix() * self.build_view_matrix()
    }
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct CameraUniform {
    /// The eye position of the camera in homogenous coordinates.
    ///
    /// Homogenous coordinates are used to fullfill the 16 byte alignment requirement.
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
    /// World to view transform, used to bring normals into view space
    pub view: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::<f32>::identity().into(),
            view: Matrix4::<f32>::identity().into(),
        }
    }
}
