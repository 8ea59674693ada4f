//! Configuration for costlens.
//!
//! Settings are loaded from `~/.costlens/config.yaml` when present and fall
//! back to built-in defaults otherwise. Every field can also be overridden
//! from the CLI, so a config file is never required.
//!
//! ## Example config file
//!
//! ```yaml
//! db_path: /var/lib/costlens/costs.db
//! generation:
//!   lookback_days: 30
//!   interval_secs: 21600
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Top-level costlens configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database file
    pub db_path: PathBuf,

    /// Directory for log files
    pub log_dir: PathBuf,

    /// Recommendation generation settings
    pub generation: GenerationConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = default_data_dir().unwrap_or_else(|_| PathBuf::from(".costlens"));
        Self {
            db_path: data_dir.join("costs.db"),
            log_dir: data_dir.join("logs"),
            generation: GenerationConfig::default(),
        }
    }
}

/// Settings for the recommendation generation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// How many days of history the analysis window covers
    pub lookback_days: i64,

    /// Interval between scheduled generation runs, in seconds
    pub interval_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            interval_secs: 21_600, // 6 hours
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the default location.
    ///
    /// Reads `~/.costlens/config.yaml` if it exists; otherwise returns the
    /// built-in defaults. A file that exists but fails to parse is an error,
    /// not a silent fallback.
    pub fn load() -> Result<Self> {
        let path = default_config_file()?;
        if path.exists() {
            Self::from_yaml(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::io("reading config", path, e))?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigInvalid {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.generation.lookback_days < 1 {
            return Err(CoreError::ConfigValidation {
                message: "generation.lookback_days must be at least 1".to_string(),
            });
        }
        if self.generation.interval_secs < 60 {
            return Err(CoreError::ConfigValidation {
                message: "generation.interval_secs must be at least 60".to_string(),
            });
        }
        Ok(())
    }

    /// Override the database path.
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    /// Override the log directory.
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    /// Override the analysis window length.
    pub fn with_lookback_days(mut self, days: i64) -> Self {
        self.generation.lookback_days = days;
        self
    }

    /// Override the scheduled generation interval.
    pub fn with_interval_secs(mut self, secs: u64) -> Self {
        self.generation.interval_secs = secs;
        self
    }
}

/// Get the costlens data directory.
///
/// Returns `~/.costlens/`
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".costlens"))
        .ok_or(CoreError::HomeDirUnavailable)
}

/// Get the default config file path.
///
/// Returns `~/.costlens/config.yaml`
pub fn default_config_file() -> Result<PathBuf> {
    Ok(default_data_dir()?.join("config.yaml"))
}

/// Get the default database path.
///
/// Returns `~/.costlens/costs.db`
pub fn default_db_path() -> Result<PathBuf> {
    Ok(default_data_dir()?.join("costs.db"))
}
