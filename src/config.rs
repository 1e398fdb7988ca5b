//! Playback configuration loaded from ~/.tweenscript/config.yaml.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::animation::Easing;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Settings shared by the runtime, the scene and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Frames per second for stepped playback.
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Seed for the script-visible `Random` global.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Tween length in seconds when a builder gives none.
    #[serde(default = "default_duration")]
    pub default_duration: f64,
    #[serde(default)]
    pub default_easing: Easing,
    /// Half-extents of the box that moving primitives bounce inside.
    #[serde(default = "default_bounds")]
    pub bounds: [f32; 2],
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default = "default_text_size")]
    pub text_size: f32,
    #[serde(default = "default_circle_segments")]
    pub circle_segments: u32,
}

fn default_fps() -> u32 {
    60
}

fn default_seed() -> u64 {
    42
}

fn default_duration() -> f64 {
    1.0
}

fn default_bounds() -> [f32; 2] {
    [1.0, 1.0]
}

fn default_font() -> String {
    "default".to_string()
}

fn default_text_size() -> f32 {
    0.1
}

fn default_circle_segments() -> u32 {
    48
}

impl PlaybackConfig {
    /// Load from the standard path (~/.tweenscript/config.yaml).
    /// Returns None if the file is missing or unreadable.
    pub fn load() -> Option<Self> {
        Self::load_from_home(&dirs::home_dir()?)
    }

    /// Load `<home>/.tweenscript/config.yaml`. A missing file is None; an
    /// invalid one is logged and also None.
    pub fn load_from_home(home: &Path) -> Option<Self> {
        let path = home.join(".tweenscript").join("config.yaml");
        match Self::from_path(&path) {
            Ok(config) => Some(config),
            Err(ConfigError::Io(_)) => None,
            Err(e) => {
                log::warn!("ignoring {}: {e}", path.display());
                None
            }
        }
    }

    /// Load from an explicit file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Seconds per frame.
    pub fn frame_time(&self) -> f64 {
        1.0 / f64::from(self.fps.max(1))
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            seed: default_seed(),
            default_duration: default_duration(),
            default_easing: Easing::default(),
            bounds: default_bounds(),
            font: default_font(),
            text_size: default_text_size(),
            circle_segments: default_circle_segments(),
        }
    }
}
