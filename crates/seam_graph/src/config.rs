// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Behaviour switches of a [`GraphEngine`](crate::engine::GraphEngine).
///
/// Stored as RON, e.g.
///
/// ```ron
/// (
///     auto_show_visual_nodes: true,
///     verify_invariants: false,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Add visual nodes to the visible set as soon as they are registered
    pub auto_show_visual_nodes: bool,
    /// Check every internal invariant after each topology change and panic
    /// on the first violation. Expensive; meant for tests and debugging.
    pub verify_invariants: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_show_visual_nodes: true,
            verify_invariants: cfg!(debug_assertions),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from RON text. Missing fields keep their defaults.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&text)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }
}
