//! Per-frame shape rotation and the frame clock that drives it.

use std::time::{Duration, Instant};

use log::info;
use serde::{Deserialize, Serialize};

use super::shapes::ShapePopulation;

/// How shape orientation evolves each frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPolicy {
    /// Add each shape's angular velocity to its x/y rotation every frame
    #[default]
    Accumulate,
    /// Set x/y rotation straight from elapsed time, ignoring velocities
    TimeDriven,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatorState {
    Idle,
    Running,
}

/// Timing of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Since the clock was created
    pub elapsed: Duration,
    /// Since the previous tick
    pub delta: Duration,
}

/// Wall clock for the render loop with a smoothed FPS readout
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    smoothed_fps: f32,
    smoothing: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            start,
            last: start,
            smoothed_fps: 60.0,
            smoothing: 0.05,
        }
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let delta = now.saturating_duration_since(self.last);
        self.last = now;

        let frame_time = delta.as_secs_f32();
        if frame_time > 0.0 {
            self.smoothed_fps =
                self.smoothed_fps * (1.0 - self.smoothing) + (1.0 / frame_time) * self.smoothing;
        }

        FrameTime {
            elapsed: now.saturating_duration_since(self.start),
            delta,
        }
    }

    pub fn fps(&self) -> f32 {
        self.smoothed_fps
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Rotates every shape once per rendered frame after [`start`](Self::start)
#[derive(Debug, Clone)]
pub struct Animator {
    policy: RotationPolicy,
    state: AnimatorState,
    ticks: u64,
}

impl Animator {
    pub fn new(policy: RotationPolicy) -> Self {
        Self {
            policy,
            state: AnimatorState::Idle,
            ticks: 0,
        }
    }

    /// Enters the running state; repeated calls do nothing
    pub fn start(&mut self) {
        if self.state == AnimatorState::Idle {
            self.state = AnimatorState::Running;
            info!("Animation started ({:?} rotation)", self.policy);
        }
    }

    /// Advances every shape by one frame, returning whether anything moved
    pub fn tick(&mut self, shapes: &mut ShapePopulation, elapsed: Duration) -> bool {
        if self.state == AnimatorState::Idle {
            return false;
        }

        match self.policy {
            RotationPolicy::Accumulate => {
                for shape in shapes.iter_mut() {
                    shape.rotation.x += shape.angular_velocity.x;
                    shape.rotation.y += shape.angular_velocity.y;
                }
            }
            RotationPolicy::TimeDriven => {
                let t = elapsed.as_secs_f32();
                for shape in shapes.iter_mut() {
                    shape.rotation.x = -t;
                    shape.rotation.y = t;
                }
            }
        }

        self.ticks += 1;
        true
    }

    pub fn state(&self) -> AnimatorState {
        self.state
    }

    pub fn policy(&self) -> RotationPolicy {
        self.policy
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl Default for Animator {
    fn default() -> Self {
        Self::new(RotationPolicy::default())
    }
}
