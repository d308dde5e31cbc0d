//! Engine configuration.
//!
//! Configuration lives in `.bomtree/config.json` next to the data being
//! inspected, or in the user's config directory. Every field has a default,
//! so an empty JSON object is a valid config.

use crate::error::{BomError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the per-project configuration directory.
pub const CONFIG_DIR: &str = ".bomtree";

/// Name of the configuration file inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.json";

/// How quantities combine along the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityMode {
    /// Multiply each quantity by every ancestor quantity (BOM explosion).
    /// Two sub-assemblies holding three bolts each yield six bolts.
    #[default]
    Exploded,
    /// Sum quantities as they appear, ignoring ancestor multipliers.
    Flat,
}

impl QuantityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exploded => "exploded",
            Self::Flat => "flat",
        }
    }
}

impl std::fmt::Display for QuantityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings that affect how the hierarchy is aggregated and displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Quantity semantics for rollups.
    pub quantity_mode: QuantityMode,

    /// Show orphan subtrees as extra top-level rows.
    pub include_orphans_in_display: bool,

    /// Default number of levels to materialize in tree views.
    pub tree_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quantity_mode: QuantityMode::Exploded,
            include_orphans_in_display: true,
            tree_depth: 8,
        }
    }
}

impl EngineConfig {
    /// Loads a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| BomError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let config: EngineConfig = serde_json::from_str(&text)
            .map_err(|e| BomError::Config(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), mode = %config.quantity_mode, "Loaded config");
        Ok(config)
    }

    /// Finds and loads the config for a directory.
    ///
    /// Looks in `<dir>/.bomtree/config.json`, then in the user config
    /// directory. Falls back to defaults when neither exists.
    pub fn discover(dir: &Path) -> Result<Self> {
        for candidate in Self::candidates(dir) {
            if candidate.is_file() {
                return Self::load(&candidate);
            }
        }
        debug!(dir = %dir.display(), "No config found, using defaults");
        Ok(Self::default())
    }

    /// Writes this config as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// The project-local config path for a directory.
    pub fn project_path(dir: &Path) -> PathBuf {
        dir.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    fn candidates(dir: &Path) -> Vec<PathBuf> {
        let mut paths = vec![Self::project_path(dir)];
        if let Some(user_dir) = dirs::config_dir() {
            paths.push(user_dir.join("bomtree").join(CONFIG_FILE));
        }
        paths
    }
}
