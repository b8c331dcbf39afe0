//! # Settings
//!
//! User defaults persisted as JSON at
//! `<config dir>/image-cluster/settings.json`.
//!
//! A missing file means defaults. A malformed file is reported rather
//! than silently replaced.

use crate::core::autolabel::DetectorSettings;
use crate::core::cluster::Threshold;
use crate::core::hasher::HashAlgorithmKind;
use crate::core::labels::LabelLayout;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "image-cluster";
const SETTINGS_FILE: &str = "settings.json";

/// Persisted user defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Clustering threshold (0-64)
    pub threshold: Threshold,
    pub algorithm: HashAlgorithmKind,
    /// Hide clusters of a single image
    pub skip_single: bool,
    /// Where label files live relative to images
    pub label_layout: LabelLayout,
    pub detector: DetectorSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            threshold: Threshold::default(),
            algorithm: HashAlgorithmKind::default(),
            skip_single: true,
            label_layout: LabelLayout::default(),
            detector: DetectorSettings::default(),
        }
    }
}

impl Settings {
    /// Default settings file location
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load from the default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path`, falling back to defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No settings file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        serde_json::from_str(&contents).map_err(|e| ConfigError::Malformed {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Save to the default location
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::default_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(io_error)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Malformed {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::write(path, json).map_err(io_error)
    }
}
