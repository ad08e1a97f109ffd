use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{autoscene::AutoSceneState, scene::Scene, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub tempo: TempoConfig,
    pub auto_scene: AutoSceneState,
    /// Scenes to load. Empty means the built-in demo set.
    pub scenes: Vec<Scene>,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing sections take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Configured scenes, or the demo set when none are configured.
    pub fn scenes_or_demo(&self) -> Vec<Scene> {
        if self.scenes.is_empty() {
            Scene::demo_set()
        } else {
            self.scenes.clone()
        }
    }
}

/// Frame loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Frames arriving sooner than this after the previous accepted frame are
    /// dropped.
    pub min_frame_interval_ms: f64,
    /// Rate at which the frame loop wakes up.
    pub refresh_rate_hz: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_frame_interval_ms: 10.0,
            refresh_rate_hz: 60.0,
        }
    }
}

/// Configuration for the internal tempo clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoConfig {
    pub bpm: f64,
    pub enabled: bool,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            enabled: true,
        }
    }
}
