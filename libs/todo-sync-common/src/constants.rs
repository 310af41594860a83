//! Constants for the todo sync client

/// Base path of the todo resource on the REST API
pub const TODOS_API_PATH: &str = "/api/v1/todos";

/// Default API base URL
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default capacity of the notification queue
pub const DEFAULT_MAX_NOTIFICATIONS: usize = 5;

/// Window during which identical error notifications are suppressed
pub const ERROR_DEDUP_WINDOW_MS: u64 = 5000;

/// Default display durations per notification type (milliseconds)
pub const SUCCESS_DURATION_MS: u64 = 3000;
pub const ERROR_DURATION_MS: u64 = 5000;
pub const INFO_DURATION_MS: u64 = 4000;
pub const WARNING_DURATION_MS: u64 = 4000;

/// Marker a transport layer puts in messages for connection failures
pub const NETWORK_ERROR_MARKER: &str = "Network Error";

/// Error code a transport layer reports for connection failures
pub const NETWORK_ERROR_CODE: &str = "ERR_NETWORK";

/// Supported locale codes
pub const SUPPORTED_LOCALES: &[&str] = &["en", "fr", "es"];

/// Locale used when none is configured or the configured one is unknown
pub const FALLBACK_LOCALE: &str = "en";
