//! Configuration Loader
//!
//! Loads [`ClientConfig`] from multiple sources with precedence:
//! defaults < configuration files (in order) < environment variables.

use crate::config::ClientConfig;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Configuration loader that handles multiple sources with precedence
pub struct ConfigLoader {
    /// Base configuration
    base_config: ClientConfig,
    /// Configuration file paths to try in order
    config_paths: Vec<PathBuf>,
    /// Whether to load from environment variables
    load_from_env: bool,
    /// Whether to validate the final configuration
    validate: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_config: ClientConfig::default(),
            config_paths: Self::get_default_config_paths(),
            load_from_env: true,
            validate: true,
        }
    }

    /// Set the base configuration
    #[must_use]
    pub fn with_base_config(mut self, config: ClientConfig) -> Self {
        self.base_config = config;
        self
    }

    /// Add a configuration file path
    #[must_use]
    pub fn add_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Set configuration file paths
    #[must_use]
    pub fn with_config_paths<P: AsRef<Path>>(mut self, paths: Vec<P>) -> Self {
        self.config_paths = paths
            .into_iter()
            .map(|p| p.as_ref().to_path_buf())
            .collect();
        self
    }

    /// Enable or disable loading from environment variables
    #[must_use]
    pub fn with_env_loading(mut self, enabled: bool) -> Self {
        self.load_from_env = enabled;
        self
    }

    /// Enable or disable configuration validation
    #[must_use]
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate = enabled;
        self
    }

    /// Load configuration from all sources
    ///
    /// Unreadable files are skipped with a warning; invalid environment
    /// values and a failed validation are errors.
    ///
    /// # Errors
    /// Returns an error if an environment variable is invalid or the final
    /// configuration does not validate
    pub fn load(&self) -> Result<ClientConfig> {
        let mut config = self.base_config.clone();
        debug!("Starting configuration loading process");

        for path in &self.config_paths {
            if !path.exists() {
                debug!("Configuration file not found: {}", path.display());
                continue;
            }
            match ClientConfig::from_file(path) {
                Ok(file_config) => {
                    config.merge_with(&file_config);
                    info!("Loaded configuration from: {}", path.display());
                }
                Err(e) => {
                    warn!(
                        "Failed to load configuration from {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }

        if self.load_from_env {
            debug!("Loading configuration from environment variables");
            config.apply_env()?;
        }

        if self.validate {
            config.validate()?;
            debug!("Configuration validation passed");
        }

        Ok(config)
    }

    /// Get the default configuration file paths to try
    #[must_use]
    pub fn get_default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("todo-sync.yaml"),
            PathBuf::from("todo-sync.yml"),
            PathBuf::from("todo-sync.json"),
        ];

        if let Ok(home) = std::env::var("HOME") {
            let dir = PathBuf::from(home).join(".config").join("todo-sync");
            paths.push(dir.join("config.yaml"));
            paths.push(dir.join("config.json"));
        }

        paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Load configuration with the default loader
///
/// # Errors
/// Returns an error if configuration cannot be loaded or is invalid
pub fn load_config() -> Result<ClientConfig> {
    ConfigLoader::new().load()
}

/// Load configuration from explicit paths (plus the environment)
///
/// # Errors
/// Returns an error if configuration cannot be loaded or is invalid
pub fn load_config_with_paths<P: AsRef<Path>>(paths: Vec<P>) -> Result<ClientConfig> {
    ConfigLoader::new().with_config_paths(paths).load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Locale;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_loader_defaults() {
        let config = ConfigLoader::new()
            .with_config_paths::<PathBuf>(vec![])
            .with_env_loading(false)
            .load()
            .unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_loader_file_precedence() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.yaml");
        let second = dir.path().join("second.json");
        std::fs::write(
            &first,
            "api:\n  base_url: https://first.example.com\nlocale: fr\n",
        )
        .unwrap();
        std::fs::write(&second, r#"{"api": {"base_url": "https://second.example.com"}}"#)
            .unwrap();

        let config = ConfigLoader::new()
            .with_config_paths(vec![&first, &second])
            .with_env_loading(false)
            .load()
            .unwrap();

        assert_eq!(config.api.base_url, "https://second.example.com");
        assert_eq!(config.locale, Locale::Fr);
    }

    #[test]
    fn test_loader_skips_broken_and_missing_files() {
        let dir = TempDir::new().unwrap();
        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{").unwrap();

        let config = ConfigLoader::new()
            .with_config_paths(vec![broken, dir.path().join("missing.yaml")])
            .with_env_loading(false)
            .load()
            .unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_loader_validation() {
        let mut invalid = ClientConfig::default();
        invalid.notifications.max_notifications = 0;

        let loader = ConfigLoader::new()
            .with_base_config(invalid)
            .with_config_paths::<PathBuf>(vec![])
            .with_env_loading(false);
        assert!(loader.load().is_err());

        let loader = loader.with_validation(false);
        assert!(loader.load().is_ok());
    }

    #[test]
    #[serial]
    fn test_env_overrides_files() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("config.yaml");
        std::fs::write(&file, "api:\n  base_url: https://file.example.com\n").unwrap();

        std::env::set_var("TODO_API_BASE_URL", "https://env.example.com");
        let result = ConfigLoader::new().with_config_paths(vec![&file]).load();
        std::env::remove_var("TODO_API_BASE_URL");

        assert_eq!(result.unwrap().api.base_url, "https://env.example.com");
    }

    #[test]
    fn test_default_config_paths() {
        let paths = ConfigLoader::get_default_config_paths();
        assert!(paths.contains(&PathBuf::from("todo-sync.yaml")));
        assert!(paths.len() >= 3);
    }
}
