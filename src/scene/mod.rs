//! # Scene Logic
//!
//! The parts of the demo that have nothing to do with the GPU: the shape
//! population, per-frame rotation, text regeneration, and [`SceneState`],
//! which wires parameter edits to all of them.
//!
//! Rendering only ever sees the [`SceneGraph`](crate::gfx::scene::SceneGraph)
//! that `SceneState` keeps in sync.

pub mod animator;
pub mod shapes;
pub mod state;
pub mod text;

pub use animator::{Animator, AnimatorState, FrameClock, FrameTime, RotationPolicy};
pub use shapes::{FamilyDefinition, FamilyGeometry, FamilyParams, ShapeFamily, ShapePopulation, ShapeRecord};
pub use state::{FontStatus, SceneBuilder, SceneState};
pub use text::{TextOutcome, TextRegenerator};
