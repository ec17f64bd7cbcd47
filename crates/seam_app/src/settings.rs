// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runner settings.
//!
//! Everything the headless host needs besides the graph itself:
//! - Engine configuration
//! - How many frames to run, and the simulated time step
//! - Default log filter
//! - When the demo graph gets rewired

use seam_graph::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default settings file name
pub const SETTINGS_FILE_NAME: &str = "seam.ron";

/// Errors from reading or writing the settings file
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The file could not be read or written
    #[error("Settings file {}: {source}", path.display())]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The file is not valid RON
    #[error("Invalid settings: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Settings could not be serialized
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] ron::Error),
}

/// Settings of one headless run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    /// Engine behaviour
    pub engine: EngineConfig,
    /// Number of frames to run
    pub frames: u32,
    /// Simulated seconds per frame
    pub time_step: f32,
    /// Log filter used when `RUST_LOG` is not set
    pub log_filter: String,
    /// Frame after which the demo graph is rewired, if any
    pub rewire_after: Option<u32>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            frames: 8,
            time_step: 1.0 / 60.0,
            log_filter: "seam=info,seam_graph=info".to_string(),
            rewire_after: Some(4),
        }
    }
}

impl RunnerSettings {
    /// Parse settings from RON text
    pub fn from_ron(text: &str) -> Result<Self, SettingsError> {
        Ok(ron::from_str(text)?)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_ron(&text)?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings as pretty RON
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let config = ron::ser::PrettyConfig::default().struct_names(false);
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
