//! Configuration for the todo sync client
//!
//! Configuration can come from defaults, YAML/JSON files and environment
//! variables. [`crate::config_loader::ConfigLoader`] layers these sources.

use crate::error::{Result, TodoError};
use crate::messages::Locale;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use todo_sync_common::{
    parse_flag, DEFAULT_API_BASE_URL, DEFAULT_MAX_NOTIFICATIONS, DEFAULT_REQUEST_TIMEOUT_SECS,
    ERROR_DEDUP_WINDOW_MS, ERROR_DURATION_MS, INFO_DURATION_MS, SUCCESS_DURATION_MS,
    WARNING_DURATION_MS,
};

/// Complete client configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Remote API configuration
    pub api: ApiConfig,
    /// Notification center configuration
    pub notifications: NotificationConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Locale for user-facing texts
    pub locale: Locale,
}

/// Remote API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the todo REST API
    pub base_url: String,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Notification center configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Queue capacity; the oldest entry is evicted beyond it
    pub max_notifications: usize,
    /// Window during which identical error messages are suppressed
    pub dedup_window_ms: u64,
    pub success_duration_ms: u64,
    pub error_duration_ms: u64,
    pub info_duration_ms: u64,
    pub warning_duration_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            max_notifications: DEFAULT_MAX_NOTIFICATIONS,
            dedup_window_ms: ERROR_DEDUP_WINDOW_MS,
            success_duration_ms: SUCCESS_DURATION_MS,
            error_duration_ms: ERROR_DURATION_MS,
            info_duration_ms: INFO_DURATION_MS,
            warning_duration_ms: WARNING_DURATION_MS,
        }
    }
}

impl NotificationConfig {
    #[must_use]
    pub const fn dedup_window(&self) -> Duration {
        Duration::from_millis(self.dedup_window_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Emit JSON log lines
    pub json_logs: bool,
    /// Optional log file; logs go to stderr when absent
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_logs: false,
            log_file: None,
        }
    }
}

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| TodoError::configuration(format!("Invalid {name} value: {value}"))),
        Err(_) => Ok(None),
    }
}

impl ClientConfig {
    /// Load configuration from a YAML (`.yaml`/`.yml`) or JSON file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TodoError::Io(std::io::Error::other(format!(
                "Failed to read config file {}: {e}",
                path.display()
            )))
        })?;

        let config = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml" | "yml") => serde_yaml::from_str(&content).map_err(|e| {
                TodoError::configuration(format!("Failed to parse YAML config: {e}"))
            })?,
            _ => serde_json::from_str(&content).map_err(|e| {
                TodoError::configuration(format!("Failed to parse JSON config: {e}"))
            })?,
        };

        Ok(config)
    }

    /// Save configuration to a file, picking the format from the extension
    ///
    /// # Errors
    /// Returns an error if serialization or writing fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml" | "yml") => serde_yaml::to_string(self).map_err(|e| {
                TodoError::configuration(format!("Failed to serialize YAML config: {e}"))
            })?,
            _ => serde_json::to_string_pretty(self)?,
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create configuration from defaults overlaid with environment variables
    ///
    /// # Errors
    /// Returns an error if an environment variable holds an invalid value
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Overlay the `TODO_*` environment variables onto this configuration
    ///
    /// # Errors
    /// Returns an error if an environment variable holds an invalid value
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(base_url) = std::env::var("TODO_API_BASE_URL") {
            self.api.base_url = base_url;
        }
        if let Some(timeout) = parse_env("TODO_API_TIMEOUT")? {
            self.api.request_timeout_secs = timeout;
        }
        if let Some(max) = parse_env("TODO_MAX_NOTIFICATIONS")? {
            self.notifications.max_notifications = max;
        }
        if let Some(window) = parse_env("TODO_DEDUP_WINDOW_MS")? {
            self.notifications.dedup_window_ms = window;
        }
        if let Ok(level) = std::env::var("TODO_LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }
        if let Ok(json) = std::env::var("TODO_JSON_LOGS") {
            self.logging.json_logs = parse_flag(&json)
                .ok_or_else(|| TodoError::configuration("Invalid TODO_JSON_LOGS value"))?;
        }
        if let Ok(log_file) = std::env::var("TODO_LOG_FILE") {
            self.logging.log_file = Some(PathBuf::from(log_file));
        }
        if let Some(locale) = parse_env("TODO_LOCALE")? {
            self.locale = locale;
        }
        Ok(())
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns `TodoError::Configuration` describing the first invalid field
    pub fn validate(&self) -> Result<()> {
        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            return Err(TodoError::configuration("API base URL cannot be empty"));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(TodoError::configuration(format!(
                "API base URL must start with http:// or https://: {base_url}"
            )));
        }
        if self.api.request_timeout_secs == 0 {
            return Err(TodoError::configuration(
                "Request timeout must be greater than 0",
            ));
        }
        if self.notifications.max_notifications == 0 {
            return Err(TodoError::configuration(
                "Max notifications must be greater than 0",
            ));
        }
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(TodoError::configuration(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.logging.level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }

    /// Merge another configuration into this one
    ///
    /// Fields of `other` that differ from their defaults win, so a partial
    /// file only overrides what it actually sets.
    pub fn merge_with(&mut self, other: &Self) {
        let defaults = Self::default();

        if other.api.base_url != defaults.api.base_url {
            self.api.base_url.clone_from(&other.api.base_url);
        }
        if other.api.request_timeout_secs != defaults.api.request_timeout_secs {
            self.api.request_timeout_secs = other.api.request_timeout_secs;
        }

        let (n, d) = (&other.notifications, &defaults.notifications);
        if n.max_notifications != d.max_notifications {
            self.notifications.max_notifications = n.max_notifications;
        }
        if n.dedup_window_ms != d.dedup_window_ms {
            self.notifications.dedup_window_ms = n.dedup_window_ms;
        }
        if n.success_duration_ms != d.success_duration_ms {
            self.notifications.success_duration_ms = n.success_duration_ms;
        }
        if n.error_duration_ms != d.error_duration_ms {
            self.notifications.error_duration_ms = n.error_duration_ms;
        }
        if n.info_duration_ms != d.info_duration_ms {
            self.notifications.info_duration_ms = n.info_duration_ms;
        }
        if n.warning_duration_ms != d.warning_duration_ms {
            self.notifications.warning_duration_ms = n.warning_duration_ms;
        }

        if other.logging.level != defaults.logging.level {
            self.logging.level.clone_from(&other.logging.level);
        }
        if other.logging.json_logs {
            self.logging.json_logs = true;
        }
        if other.logging.log_file.is_some() {
            self.logging.log_file.clone_from(&other.logging.log_file);
        }

        if other.locale != defaults.locale {
            self.locale = other.locale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.notifications.max_notifications, 5);
        assert_eq!(config.notifications.dedup_window(), Duration::from_secs(5));
        assert_eq!(config.locale, Locale::En);
    }

    #[test]
    fn test_validation_failures() {
        let mut config = ClientConfig::default();
        config.api.base_url = "   ".to_string();
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.api.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.api.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.notifications.max_notifications = 0;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.logging.level = "loud".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = ClientConfig::default();
        config.api.base_url = "https://todos.example.com".to_string();
        config.locale = Locale::Fr;
        config.to_file(&path).unwrap();

        let loaded = ClientConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_json_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"notifications": {"max_notifications": 2}}"#).unwrap();

        let loaded = ClientConfig::from_file(&path).unwrap();
        assert_eq!(loaded.notifications.max_notifications, 2);
        assert_eq!(loaded.notifications.dedup_window_ms, 5000);
        assert_eq!(loaded.api, ApiConfig::default());
    }

    #[test]
    fn test_invalid_file_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ClientConfig::from_file(&path),
            Err(TodoError::Configuration { .. })
        ));

        assert!(matches!(
            ClientConfig::from_file(dir.path().join("missing.yaml")),
            Err(TodoError::Io(_))
        ));
    }

    #[test]
    fn test_merge_only_overrides_non_default_fields() {
        let mut base = ClientConfig::default();
        base.api.base_url = "https://one.example.com".to_string();
        base.notifications.max_notifications = 3;

        let mut other = ClientConfig::default();
        other.logging.level = "debug".to_string();
        other.locale = Locale::Es;

        base.merge_with(&other);
        assert_eq!(base.api.base_url, "https://one.example.com");
        assert_eq!(base.notifications.max_notifications, 3);
        assert_eq!(base.logging.level, "debug");
        assert_eq!(base.locale, Locale::Es);
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("TODO_API_BASE_URL", "https://env.example.com");
        std::env::set_var("TODO_MAX_NOTIFICATIONS", "7");
        std::env::set_var("TODO_JSON_LOGS", "yes");
        std::env::set_var("TODO_LOCALE", "es");

        let config = ClientConfig::from_env().unwrap();

        std::env::remove_var("TODO_API_BASE_URL");
        std::env::remove_var("TODO_MAX_NOTIFICATIONS");
        std::env::remove_var("TODO_JSON_LOGS");
        std::env::remove_var("TODO_LOCALE");

        assert_eq!(config.api.base_url, "https://env.example.com");
        assert_eq!(config.notifications.max_notifications, 7);
        assert!(config.logging.json_logs);
        assert_eq!(config.locale, Locale::Es);
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_numbers() {
        std::env::set_var("TODO_DEDUP_WINDOW_MS", "soon");
        let result = ClientConfig::from_env();
        std::env::remove_var("TODO_DEDUP_WINDOW_MS");

        let err = result.unwrap_err();
        assert!(err.to_string().contains("TODO_DEDUP_WINDOW_MS"));
    }
}
