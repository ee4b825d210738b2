//! Startup configuration loaded from TOML
//!
//! Every section is `#[serde(default)]`, so a file that only sets
//! `[font] path = "..."` is complete. Control overrides under `[parameters]`
//! go through the parameter store and are clamped like panel edits.
//!
//! ```
//! use typescape::config::SceneConfig;
//!
//! let config: SceneConfig = toml::from_str(
//!     r#"
//!     [scene]
//!     seed = 7
//!
//!     [parameters]
//!     text = "Bye"
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.scene.seed, Some(7));
//! assert_eq!(config.window.width, 1200);
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cgmath::Vector3;
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gfx::camera::Easing;
use crate::params::{ParamValue, ParameterStore};
use crate::scene::{FamilyDefinition, RotationPolicy, SceneBuilder};

const MAX_INTRO_SECS: f32 = 600.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            title: "typescape".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub path: PathBuf,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("assets/block.typeface.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Fixed RNG seed; a fresh OS seed is used when absent
    pub seed: Option<u64>,
    pub rotation_policy: RotationPolicy,
    pub families: Vec<FamilyDefinition>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            rotation_policy: RotationPolicy::default(),
            families: FamilyDefinition::defaults(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntroConfig {
    pub enabled: bool,
    /// Eye offset the camera starts from before easing onto its orbit
    pub offset: [f32; 3],
    pub duration_secs: f32,
    pub easing: Easing,
}

impl Default for IntroConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            offset: [0.0, 3.0, 4.0],
            duration_secs: 3.0,
            easing: Easing::Power2InOut,
        }
    }
}

impl IntroConfig {
    pub fn offset(&self) -> Vector3<f32> {
        Vector3::from(self.offset)
    }

    /// Tween length; NaN or non-positive values give no intro, huge ones are capped
    pub fn duration(&self) -> Duration {
        let secs = self.duration_secs;
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        if secs > MAX_INTRO_SECS {
            warn!("Intro duration {secs}s capped to {MAX_INTRO_SECS}s");
        }
        Duration::from_secs_f32(secs.min(MAX_INTRO_SECS))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub distance: f32,
    pub fov_degrees: f32,
    pub damping_factor: f32,
    pub intro: IntroConfig,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: 5.0,
            fov_degrees: 75.0,
            damping_factor: 0.05,
            intro: IntroConfig::default(),
        }
    }
}

/// Everything the binary reads at startup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub window: WindowConfig,
    pub font: FontConfig,
    pub scene: PopulationConfig,
    pub camera: CameraConfig,
    /// Control overrides keyed by config key, e.g. `text_size = 0.8`
    pub parameters: BTreeMap<String, ParamValue>,
}

impl SceneConfig {
    /// Load a config file; missing fields use defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Parameter store with the defaults overridden by `[parameters]`
    ///
    /// Unknown keys and kind mismatches are logged and skipped.
    pub fn parameter_store(&self) -> ParameterStore {
        let mut store = ParameterStore::new();
        for (key, value) in &self.parameters {
            if let Err(e) = store.set_by_key(key, value.clone()) {
                warn!("Ignoring parameter override '{key}': {e}");
            }
        }
        store
    }

    pub fn scene_builder(&self) -> SceneBuilder {
        SceneBuilder::new()
            .families(self.scene.families.clone())
            .rotation_policy(self.scene.rotation_policy)
            .seed(self.scene.seed)
            .parameters(self.parameter_store())
    }
}
