//! Rig configuration.
//!
//! A TOML file can override per-role device ids and resolutions and the
//! hardware settle delays. Everything is optional; the built-in role
//! defaults describe the rig as normally wired.

use crate::capture::Resolution;
use crate::manager::{CameraRole, Timing};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration load errors.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Per-role overrides of the built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Device index to open instead of the role default.
    pub device_id: Option<u32>,
    /// Streaming resolution instead of the role default.
    pub stream_resolution: Option<Resolution>,
    /// Still-capture resolution instead of the role default.
    pub still_resolution: Option<Resolution>,
}

/// Overrides for each camera slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RolesConfig {
    #[serde(default)]
    pub usb: RoleConfig,
    #[serde(default)]
    pub rpi: RoleConfig,
    #[serde(default, rename = "2k")]
    pub two_k: RoleConfig,
    #[serde(default, rename = "4k")]
    pub four_k: RoleConfig,
}

impl RolesConfig {
    /// Returns the overrides for one role.
    pub fn for_role(&self, role: CameraRole) -> &RoleConfig {
        match role {
            CameraRole::Usb => &self.usb,
            CameraRole::RPi => &self.rpi,
            CameraRole::TwoK => &self.two_k,
            CameraRole::FourK => &self.four_k,
        }
    }
}

/// Hardware settle delays, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Wait after a successful open before the handle is usable.
    pub warmup_ms: u64,
    /// Wait before the single read of a still capture.
    pub settle_ms: u64,
    /// Wait after releasing a device.
    pub shutdown_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            warmup_ms: 2000,
            settle_ms: 1000,
            shutdown_ms: 1000,
        }
    }
}

impl From<&TimingConfig> for Timing {
    fn from(config: &TimingConfig) -> Self {
        Timing {
            warmup: Duration::from_millis(config.warmup_ms),
            settle: Duration::from_millis(config.settle_ms),
            shutdown: Duration::from_millis(config.shutdown_ms),
        }
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RigConfig {
    #[serde(default)]
    pub roles: RolesConfig,
    #[serde(default)]
    pub timing: TimingConfig,
}

impl RigConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config: RigConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for role in CameraRole::ALL {
            let overrides = self.roles.for_role(role);
            for resolution in [overrides.stream_resolution, overrides.still_resolution]
                .into_iter()
                .flatten()
            {
                if resolution.width == 0 || resolution.height == 0 {
                    return Err(ConfigError::Invalid(format!(
                        "zero resolution configured for role {role}"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = RigConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml = r#"
            [roles.usb]
            device_id = 3

            [roles."2k"]
            stream_resolution = { width = 1280, height = 720 }

            [timing]
            warmup_ms = 0
            settle_ms = 0
            shutdown_ms = 0
        "#;
        let config: RigConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.roles.usb.device_id, Some(3));
        assert_eq!(
            config.roles.two_k.stream_resolution,
            Some(Resolution::new(1280, 720))
        );
        assert_eq!(config.timing.warmup_ms, 0);
        // Untouched roles keep no overrides.
        assert!(config.roles.four_k.device_id.is_none());
    }

    #[test]
    fn test_zero_resolution_rejected() {
        let toml = r#"
            [roles.rpi]
            still_resolution = { width = 0, height = 720 }
        "#;
        let config: RigConfig = toml::from_str(toml).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
