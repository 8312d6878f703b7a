//! Configuration file support for WaterCheck.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/watercheck/config.toml`.

use crate::{Error, Result, DEFAULT_DAILY_GOAL_ML};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub goal: GoalConfig,

    #[serde(default)]
    pub history: HistoryConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Daily goal configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GoalConfig {
    /// Goal used until the user sets one, and whenever the stored one is invalid
    #[serde(default = "default_goal_ml")]
    pub default_ml: f64,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            default_ml: default_goal_ml(),
        }
    }
}

/// History retention configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct HistoryConfig {
    /// Keep archived days for this many days; unset keeps everything
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_days: Option<u32>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("watercheck")
}

fn default_goal_ml() -> f64 {
    DEFAULT_DAILY_GOAL_ML
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("watercheck").join("config.toml")
    }

    /// Check values that serde alone cannot
    pub fn validate(&self) -> Result<()> {
        let goal = self.goal.default_ml;
        if !goal.is_finite() || goal <= 0.0 {
            return Err(Error::Config(format!(
                "goal.default_ml must be a positive number, got {}",
                goal
            )));
        }
        if self.history.retention_days == Some(0) {
            return Err(Error::Config(
                "history.retention_days must be at least 1 (omit it to keep everything)".into(),
            ));
        }
        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
