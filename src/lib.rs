//! typescape
//!
//! An extruded, bevelled 3D text mesh in a field of spinning cubes,
//! tetrahedra and tori, tuned live from an imgui control panel.
//!
//! The crate splits into scene logic that runs without a GPU ([`params`],
//! [`scene`], and the geometry half of [`gfx`]) and the windowed shell
//! ([`app`], [`ui`], [`gfx::rendering`]).

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod params;
pub mod scene;
pub mod ui;

pub use app::TypescapeApp;
pub use config::SceneConfig;
pub use error::SceneError;
