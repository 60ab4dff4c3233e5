// SPDX-License-Identifier: GPL-3.0-only

//! User configuration handling
//!
//! Configuration is stored as JSON under the user config directory and
//! falls back to defaults when missing or unreadable.

use crate::backends::camera::FacingMode;
use crate::constants::{capture, upload};
use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Directory name under the user config dir
const CONFIG_DIR: &str = "skincam";
/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Preferred facing mode when opening the camera
    pub facing: FacingMode,
    /// Mirror front-camera output horizontally (selfie mode)
    pub mirror_front: bool,
    /// Number of countdown ticks before the snapshot fires
    pub countdown_secs: u8,
    /// JPEG quality for captured frames (1-100)
    pub jpeg_quality: u8,
    /// Base URL of the skin-analysis backend
    pub server_url: String,
    /// Override for the photo save directory
    pub save_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            facing: FacingMode::Front, // Skin analysis is a selfie flow
            mirror_front: true,
            countdown_secs: capture::DEFAULT_COUNTDOWN_TICKS,
            jpeg_quality: capture::JPEG_QUALITY,
            server_url: upload::DEFAULT_SERVER_URL.to_string(),
            save_dir: None,
        }
    }
}

impl Config {
    /// Path of the config file
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load the configuration, falling back to defaults on any failure
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load from a specific path (defaults on missing or invalid file)
    pub fn load_from(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Persist the configuration
    pub fn save(&self) -> Result<(), AppError> {
        let path = Self::path()
            .ok_or_else(|| AppError::Config("no config directory on this system".to_string()))?;
        self.save_to(&path)
    }

    /// Persist to a specific path
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Config(format!("cannot create config dir: {}", e)))?;
        }
        let raw = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(format!("cannot serialize config: {}", e)))?;
        std::fs::write(path, raw)
            .map_err(|e| AppError::Config(format!("cannot write config: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.facing, FacingMode::Front);
        assert!(config.mirror_front);
        assert_eq!(config.countdown_secs, 3);
        assert_eq!(config.jpeg_quality, 95);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.facing = FacingMode::Rear;
        config.countdown_secs = 5;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"countdown_secs": 5}"#).unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded.countdown_secs, 5);
        assert_eq!(loaded.jpeg_quality, Config::default().jpeg_quality);
    }
}
