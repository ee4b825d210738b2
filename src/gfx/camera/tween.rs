//! Eased interpolation for the camera intro.

use std::time::Duration;

use cgmath::{Vector3, VectorSpace};
use serde::{Deserialize, Serialize};

/// Easing curve applied to normalized time
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    QuadraticOut,
    CubicOut,
    /// Symmetric quadratic ease-in-out
    #[default]
    Power2InOut,
    ExpoOut,
}

impl Easing {
    /// Eased value for `t`, which is clamped to `[0, 1]`
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadraticOut => {
                let omt = 1.0 - t;
                1.0 - omt * omt
            }
            Easing::CubicOut => {
                let omt = 1.0 - t;
                1.0 - omt * omt * omt
            }
            Easing::Power2InOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    let u = -2.0 * t + 2.0;
                    1.0 - u * u / 2.0
                }
            }
            Easing::ExpoOut => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f32.powf(-10.0 * t)
                }
            }
        }
    }
}

/// Interpolates a vector from `from` to `to` over `duration`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector3Tween {
    pub from: Vector3<f32>,
    pub to: Vector3<f32>,
    pub duration: Duration,
    pub easing: Easing,
    elapsed: Duration,
}

impl Vector3Tween {
    pub fn new(from: Vector3<f32>, to: Vector3<f32>, duration: Duration, easing: Easing) -> Self {
        Self {
            from,
            to,
            duration,
            easing,
            elapsed: Duration::ZERO,
        }
    }

    /// Steps the tween forward and returns the current value
    pub fn advance(&mut self, dt: Duration) -> Vector3<f32> {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.value()
    }

    pub fn value(&self) -> Vector3<f32> {
        if self.duration.is_zero() {
            return self.to;
        }
        let t = self.elapsed.as_secs_f32() / self.duration.as_secs_f32();
        self.from.lerp(self.to, self.easing.evaluate(t))
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}
