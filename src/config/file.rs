//! Configuration file loading
//!
//! Handles loading configuration from TOML files.

use crate::config::Config;
use crate::error::ConfigError;

use std::path::{Path, PathBuf};

/// Configuration file handler
pub struct ConfigFile;

impl ConfigFile {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load_default() -> Option<Config> {
        for path in Self::default_paths() {
            if path.exists() {
                match Self::load(&path) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", path.display());
                        return Some(config);
                    }
                    Err(e) => log::warn!("Ignoring {}: {}", path.display(), e),
                }
            }
        }
        None
    }

    /// Get default configuration file paths
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // System-wide config
        paths.push(PathBuf::from("/etc/nvhot/config.toml"));

        // User config
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("nvhot/config.toml"));
        }

        // Current directory
        paths.push(PathBuf::from("nvhot.toml"));

        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_paths_not_empty() {
        let paths = ConfigFile::default_paths();
        assert!(!paths.is_empty());
        assert_eq!(paths[0], PathBuf::from("/etc/nvhot/config.toml"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = ConfigFile::load("/nonexistent/path/config.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[paths]\nmem_device = \"/tmp/fake-mem\"\n\n[general]\nverbose = true"
        )
        .unwrap();

        let config = ConfigFile::load(file.path()).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.paths.mem_device, PathBuf::from("/tmp/fake-mem"));
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[general\ninterval_seconds = ").unwrap();

        assert!(matches!(
            ConfigFile::load(file.path()),
            Err(ConfigError::TomlError(_))
        ));
    }

    #[test]
    fn test_load_invalid_value() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[general]\ninterval_seconds = 0").unwrap();

        assert!(matches!(
            ConfigFile::load(file.path()),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
