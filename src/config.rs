use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// How many entries the landing feed shows
    #[serde(default = "default_feed_limit")]
    pub feed_limit: usize,
    /// How many entries each per-kind feed lane shows
    #[serde(default = "default_feed_lane_limit")]
    pub feed_lane_limit: usize,
    /// Poll fallback for the feed watcher, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// How long a position request may take before it counts as denied
    #[serde(default = "default_location_timeout_secs")]
    pub location_timeout_secs: u64,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            feed_limit: default_feed_limit(),
            feed_lane_limit: default_feed_lane_limit(),
            poll_interval_ms: default_poll_interval_ms(),
            location_timeout_secs: default_location_timeout_secs(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

// Default value functions

fn default_database_path() -> String {
    // This is a fallback - actual profile will be determined at load time
    if let Some(data_dir) = utils::get_data_dir(utils::Profile::Prod) {
        data_dir.join("cityscape.db").to_string_lossy().to_string()
    } else {
        "~/.local/share/cityscape/cityscape.db".to_string()
    }
}

fn default_feed_limit() -> usize {
    crate::activity::FEED_LIMIT
}

fn default_feed_lane_limit() -> usize {
    crate::activity::LANE_LIMIT
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_location_timeout_secs() -> u64 {
    10
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
}

impl Config {
    /// Load configuration from file, or create default if missing
    /// Uses the provided profile to determine config and database paths
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            let mut config: Config = toml::from_str(&contents)?;

            // Ensure database path matches profile (in case config was manually edited)
            config.database_path = Self::default_database_path_for_profile(profile);

            Ok(config)
        } else {
            // Create default config and save it
            let mut config = Config::default();
            config.database_path = Self::default_database_path_for_profile(profile);
            config.save_with_profile(profile)?;
            Ok(config)
        }
    }

    /// Load configuration from file, using production profile
    /// Use load_with_profile() to specify a different profile
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_profile(utils::Profile::Prod)
    }

    /// Save configuration to file
    pub fn save_with_profile(&mut self, profile: utils::Profile) -> Result<(), ConfigError> {
        // Ensure config version is set before saving
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        let config_path = Self::get_config_path(profile)?;

        // Create parent directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, toml_string)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile).ok_or_else(|| {
            ConfigError::ConfigDirError("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get default database path for a specific profile
    fn default_database_path_for_profile(profile: utils::Profile) -> String {
        if let Some(data_dir) = utils::get_data_dir(profile) {
            data_dir.join("cityscape.db").to_string_lossy().to_string()
        } else {
            match profile {
                utils::Profile::Dev => "~/.local/share/cityscape-dev/cityscape.db".to_string(),
                utils::Profile::Prod => "~/.local/share/cityscape/cityscape.db".to_string(),
            }
        }
    }

    /// Get the expanded database path (with ~ expansion)
    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }

    pub fn poll_interval(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.poll_interval_ms as i64)
    }

    pub fn location_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.location_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_missing_fields() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.feed_limit, 8);
        assert_eq!(config.feed_lane_limit, 4);
        assert_eq!(config.poll_interval_ms, 2000);
        assert_eq!(config.location_timeout_secs, 10);
    }

    #[test]
    fn partial_file_keeps_its_overrides() {
        let config: Config = toml::from_str("feed_limit = 20").unwrap();
        assert_eq!(config.feed_limit, 20);
        assert_eq!(config.poll_interval_ms, 2000);
    }

    #[test]
    fn round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.database_path, config.database_path);
        assert_eq!(back.config_version, Some(CURRENT_CONFIG_VERSION));
    }
}
