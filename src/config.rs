//! Application configuration, loaded from `<config dir>/padbridge/config.toml`
//! with defaults for anything missing.

use crate::bridge::bridge_handle::BridgeSettings;
use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct BridgeConfig {
    /// Gates all polling and emission.
    pub enabled: bool,
    /// Deadzone radius for stick axes.
    pub axis_threshold: f32,
    /// Frame-tick period in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            axis_threshold: crate::bridge::diff::DEFAULT_AXIS_THRESHOLD,
            poll_interval_ms: 16,
        }
    }
}

impl BridgeConfig {
    pub fn settings(&self) -> BridgeSettings {
        BridgeSettings {
            enabled: self.enabled,
            axis_threshold: self.axis_threshold,
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("padbridge").join("config.toml"))
    }

    /// Load the configuration file if it exists, defaults otherwise. A file
    /// that exists but does not parse is an error the caller surfaces.
    pub async fn load() -> Result<Self> {
        let Some(path) = Self::config_path() else {
            debug!("No config directory on this platform, using defaults");
            return Ok(Self::default());
        };

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| eyre!("Failed to read config file {:?}: {}", path, e))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| eyre!("Failed to parse config file: {}", e))?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_wire_protocol() {
        let config = BridgeConfig::default();
        assert!(config.enabled);
        assert_eq!(config.axis_threshold, 0.15);
        assert_eq!(config.poll_interval_ms, 16);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: BridgeConfig = toml::from_str("axis_threshold = 0.2\n").unwrap();
        assert_eq!(config.axis_threshold, 0.2);
        assert!(config.enabled);
        assert_eq!(config.poll_interval_ms, 16);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = BridgeConfig {
            enabled: false,
            axis_threshold: 0.1,
            poll_interval_ms: 33,
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let back: BridgeConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.enabled, config.enabled);
        assert_eq!(back.axis_threshold, config.axis_threshold);
        assert_eq!(back.poll_interval_ms, config.poll_interval_ms);
    }
}
