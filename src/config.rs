use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::aggregate::ViewOptions;
use crate::error::ConfigError;

const CONFIG_DIR_NAME: &str = "defect-dashboard";
const CONFIG_FILE_NAME: &str = "config.json";

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// User-level settings. Every field has a default, so a partial file works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dataset opened at startup when no path is given on the command line.
    pub default_data_file: PathBuf,
    /// Truncation limits for the module chart and the risk ranking.
    pub views: ViewOptions,
    /// How many ranked modules the risk callout lists.
    pub risk_highlight_limit: usize,
    /// Initial state of the "Show all columns" toggle.
    pub show_all_columns: bool,
    pub window_size: [f32; 2],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_data_file: PathBuf::from("defects.csv"),
            views: ViewOptions::default(),
            risk_highlight_limit: 5,
            show_all_columns: false,
            window_size: [1280.0, 900.0],
        }
    }
}

impl Config {
    /// Load from an explicit path, or from the per-user config file, or fall
    /// back to defaults. Only an unreadable or malformed file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => match Self::config_path() {
                Some(p) if p.exists() => p,
                _ => {
                    log::debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// `<config_dir>/defect-dashboard/config.json`, if the platform has one.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }
}
