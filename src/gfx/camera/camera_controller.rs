use log::debug;
use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, KeyEvent, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
};

use super::orbit_camera::OrbitCamera;

/// Mouse-driven orbit controls with inertia
///
/// Input only accumulates velocity; [`update`](Self::update) applies a
/// `damping_factor` share of it each frame and decays the rest, so motion
/// eases out after the mouse stops.
pub struct CameraController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub damping_factor: f32,
    yaw_velocity: f32,
    pitch_velocity: f32,
    zoom_velocity: f32,
    pan_velocity: (f32, f32),
    is_shift_held: bool,
    is_mouse_pressed: bool,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            pan_speed: 0.01,
            damping_factor: 0.05,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
            zoom_velocity: 0.0,
            pan_velocity: (0.0, 0.0),
            is_shift_held: false,
            is_mouse_pressed: false,
        }
    }

    pub fn with_damping(mut self, damping_factor: f32) -> Self {
        self.damping_factor = damping_factor.clamp(0.001, 1.0);
        self
    }

    pub fn process_events(&mut self, event: &DeviceEvent) {
        match event {
            DeviceEvent::Button {
                button: 0, // Left Mouse Button
                state,
            } => {
                self.is_mouse_pressed = *state == ElementState::Pressed;
            }
            DeviceEvent::MouseWheel { delta, .. } => {
                let scroll_amount = -match delta {
                    MouseScrollDelta::LineDelta(_, scroll) => *scroll,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y: scroll, .. }) => {
                        *scroll as f32 * 0.01
                    }
                };
                self.zoom_velocity += scroll_amount * self.zoom_speed;
            }
            DeviceEvent::MouseMotion { delta } if self.is_mouse_pressed => {
                if self.is_shift_held {
                    self.pan_velocity.0 -= delta.0 as f32 * self.pan_speed;
                    self.pan_velocity.1 += delta.1 as f32 * self.pan_speed;
                } else {
                    self.yaw_velocity -= delta.0 as f32 * self.rotate_speed;
                    self.pitch_velocity += delta.1 as f32 * self.rotate_speed;
                }
            }
            _ => (),
        }
    }

    pub fn process_keyed_events(&mut self, event: &KeyEvent) {
        if let KeyEvent {
            physical_key: PhysicalKey::Code(KeyCode::ShiftLeft | KeyCode::ShiftRight),
            state,
            ..
        } = event
        {
            let held = *state == ElementState::Pressed;
            if held != self.is_shift_held {
                debug!("Pan mode {}", if held { "on" } else { "off" });
            }
            self.is_shift_held = held;
        }
    }

    /// Applies one frame of accumulated motion to `camera`
    ///
    /// Returns whether the camera moved noticeably.
    pub fn update(&mut self, camera: &mut OrbitCamera) -> bool {
        let k = self.damping_factor;
        let moving = self.yaw_velocity.abs() > 1e-5
            || self.pitch_velocity.abs() > 1e-5
            || self.zoom_velocity.abs() > 1e-5
            || self.pan_velocity.0.abs() > 1e-5
            || self.pan_velocity.1.abs() > 1e-5;
        if !moving {
            return false;
        }

        camera.add_yaw(self.yaw_velocity * k);
        camera.add_pitch(self.pitch_velocity * k);
        camera.add_distance(self.zoom_velocity * k);
        camera.pan((self.pan_velocity.0 * k, self.pan_velocity.1 * k));

        let decay = 1.0 - k;
        self.yaw_velocity *= decay;
        self.pitch_velocity *= decay;
        self.zoom_velocity *= decay;
        self.pan_velocity.0 *= decay;
        self.pan_velocity.1 *= decay;
        true
    }

    /// Returns true if currently panning
    pub fn is_panning(&self) -> bool {
        self.is_mouse_pressed && self.is_shift_held
    }

    /// Returns true if currently rotating
    pub fn is_rotating(&self) -> bool {
        self.is_mouse_pressed && !self.is_shift_held
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Vector3, Zero};

    #[test]
    fn drag_motion_eases_out() {
        let mut camera = OrbitCamera::new(5.0, 0.0, 0.0, Vector3::zero(), 1.0);
        let mut controller = CameraController::new(0.01, 1.0);

        controller.process_events(&DeviceEvent::Button {
            button: 0,
            state: ElementState::Pressed,
        });
        controller.process_events(&DeviceEvent::MouseMotion { delta: (-100.0, 0.0) });
        assert!(controller.is_rotating());

        assert!(controller.update(&mut camera));
        let first_step = camera.yaw;
        assert!((first_step - 0.05).abs() < 1e-6);

        controller.update(&mut camera);
        let second_step = camera.yaw - first_step;
        assert!(second_step < first_step);
        assert!((second_step - 0.05 * 0.95).abs() < 1e-6);
    }

    #[test]
    fn motion_without_button_is_ignored() {
        let mut camera = OrbitCamera::new(5.0, 0.0, 0.0, Vector3::zero(), 1.0);
        let mut controller = CameraController::new(0.01, 1.0);
        controller.process_events(&DeviceEvent::MouseMotion { delta: (50.0, 50.0) });
        assert!(!controller.update(&mut camera));
        assert_eq!(camera.yaw, 0.0);
    }

    #[test]
    fn wheel_zooms_with_inertia() {
        let mut camera = OrbitCamera::new(5.0, 0.0, 0.0, Vector3::zero(), 1.0);
        let mut controller = CameraController::new(0.01, 1.0);
        controller.process_events(&DeviceEvent::MouseWheel {
            delta: MouseScrollDelta::LineDelta(0.0, 2.0),
        });
        for _ in 0..200 {
            controller.update(&mut camera);
        }
        assert!(camera.distance < 5.0);
        assert!(camera.distance > 2.9);
    }
}
