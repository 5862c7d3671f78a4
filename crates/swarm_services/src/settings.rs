//! Settings management
//!
//! One JSON document holding the flock tunables, the window and the scene
//! inputs fed to the pipeline each frame. Every field is optional in the
//! file; missing ones take their defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use swarm_core::{ConfigError, FlockConfig, ObstacleSource};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid settings: {0}")]
    Invalid(#[from] ConfigError),
}

/// Engine settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub swarm: FlockConfig,
    pub window: WindowSettings,
    pub scene: SceneSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Fly Swarm".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Host inputs the runtime passes to the pipeline every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub emitter_origin: Vec3,
    /// Seek target. `None` seeks the emitter.
    pub target: Option<Vec3>,
    pub obstacles: Vec<ObstacleSource>,
    pub show_bounds: bool,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            emitter_origin: Vec3::ZERO,
            target: None,
            obstacles: vec![ObstacleSource::uniform(Vec3::new(6.0, 0.0, 0.0), 3.0)],
            show_bounds: true,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        match fs::read_to_string(path) {
            Ok(json) => {
                let settings = Self::from_json(&json)?;
                info!(path = %path.display(), "settings loaded");
                Ok(settings)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no settings file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(SettingsError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.swarm.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_json() {
        let settings = Settings::default();
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let settings = Settings::from_json(
            r#"{ "swarm": { "population": 256 }, "scene": { "target": [1.0, 2.0, 3.0] } }"#,
        )
        .unwrap();
        assert_eq!(settings.swarm.population, 256);
        assert_eq!(settings.swarm.separation_weight, 1.0);
        assert_eq!(settings.scene.target, Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(settings.window, WindowSettings::default());
    }

    #[test]
    fn invalid_tunables_are_rejected() {
        let err = Settings::from_json(r#"{ "swarm": { "population": 0 } }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(ConfigError::EmptyPopulation)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(Settings::from_json("{ nope"), Err(SettingsError::Parse(_))));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("swarm-settings-that-does-not-exist.json");
        assert_eq!(Settings::load(&path).unwrap(), Settings::default());
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("swarm-settings-{}.json", std::process::id()));
        let mut settings = Settings::default();
        settings.scene.show_bounds = false;
        settings.swarm.seed = Some(9);
        settings.save(&path).unwrap();
        let loaded = Settings::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, settings);
    }
}
