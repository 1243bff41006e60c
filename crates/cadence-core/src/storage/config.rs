//! TOML-based application configuration.
//!
//! Stores user preferences for new entries: default durations and the
//! default color applied when none is given.
//!
//! Configuration is stored at `~/.config/cadence/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;

/// Defaults applied to newly created tasks and habits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_task_duration")]
    pub task_duration_minutes: i64,
    #[serde(default = "default_habit_duration")]
    pub habit_duration_minutes: i64,
    #[serde(default = "default_color")]
    pub color: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/cadence/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

// Default functions
fn default_task_duration() -> i64 {
    60
}
fn default_habit_duration() -> i64 {
    25
}
fn default_color() -> String {
    "#CCCCCC".into()
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            task_duration_minutes: default_task_duration(),
            habit_duration_minutes: default_habit_duration(),
            color: default_color(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/cadence"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load the configuration, falling back to defaults when the file does
    /// not exist yet.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Persist the configuration.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let raw = toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(&path, raw).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_store_column_defaults() {
        let config = Config::default();
        assert_eq!(config.defaults.task_duration_minutes, 60);
        assert_eq!(config.defaults.habit_duration_minutes, 25);
        assert_eq!(config.defaults.color, "#CCCCCC");
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str("[defaults]\ntask_duration_minutes = 90\n").unwrap();
        assert_eq!(config.defaults.task_duration_minutes, 90);
        assert_eq!(config.defaults.habit_duration_minutes, 25);
        assert_eq!(config.defaults.color, "#CCCCCC");
    }
}
