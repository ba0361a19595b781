//! Configuration system
//!
//! Handles TOML config file parsing and CLI argument merging.

pub mod builder;
pub mod file;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;

use crate::error::ConfigError;
use crate::mem::devmem::DEFAULT_MEM_DEVICE;
use crate::pci::scan::DEFAULT_PCI_DEVICES;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Device paths
    pub paths: PathsConfig,
    /// GPU selection settings
    pub gpu: GpuConfig,
}

impl Config {
    /// Check values that cannot be expressed in the type system
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.general.interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                key: "general.interval_seconds".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.paths.mem_device.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "paths.mem_device".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.paths.pci_devices.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "paths.pci_devices".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,
    /// Polling interval in seconds for `watch`
    pub interval_seconds: u64,
}

impl GeneralConfig {
    /// Polling interval as a Duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            interval_seconds: 1,
        }
    }
}

/// Device path configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Raw physical memory device
    pub mem_device: PathBuf,
    /// sysfs directory listing PCI devices
    pub pci_devices: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            mem_device: PathBuf::from(DEFAULT_MEM_DEVICE),
            pci_devices: PathBuf::from(DEFAULT_PCI_DEVICES),
        }
    }
}

/// GPU selection configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GpuConfig {
    /// Target GPU by index
    pub index: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.interval_seconds, 1);
        assert_eq!(config.paths.mem_device, PathBuf::from("/dev/mem"));
        assert_eq!(
            config.paths.pci_devices,
            PathBuf::from("/sys/bus/pci/devices")
        );
        assert!(config.gpu.index.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [general]
            interval_seconds = 5

            [gpu]
            index = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.general.interval(), Duration::from_secs(5));
        assert_eq!(config.gpu.index, Some(1));
        assert_eq!(config.paths.mem_device, PathBuf::from("/dev/mem"));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.general.interval_seconds = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "general.interval_seconds"
        ));
    }

    #[test]
    fn test_validate_rejects_empty_paths() {
        let mut config = Config::default();
        config.paths.mem_device = PathBuf::new();
        assert!(config.validate().is_err());
    }
}
