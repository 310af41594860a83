//! Error types for the todo sync library

use std::fmt;
use thiserror::Error;
use todo_sync_common::{NETWORK_ERROR_CODE, NETWORK_ERROR_MARKER};

/// Result type alias for todo sync operations
pub type Result<T> = std::result::Result<T, TodoError>;

/// Main error type for todo sync operations
#[derive(Error, Debug)]
pub enum TodoError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Cannot {operation} a todo without an ID")]
    MissingId { operation: &'static str },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown error: {message}")]
    Unknown { message: String },
}

impl TodoError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an unknown error
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    /// Create the error raised when a mutation needs an id the todo lacks
    #[must_use]
    pub const fn missing_id(operation: &'static str) -> Self {
        Self::MissingId { operation }
    }

    /// The transport failure behind this error, if any
    #[must_use]
    pub const fn as_transport(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }

    /// Whether this error is a programmer error rather than a runtime failure
    #[must_use]
    pub const fn is_programmer_error(&self) -> bool {
        matches!(self, Self::MissingId { .. })
    }
}

/// Failure reported by the remote todo service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    /// HTTP status, absent when no response was received
    pub status: Option<u16>,
    /// Transport-level description of the failure
    pub message: String,
    /// `message` field of the server's error body, if it sent one
    pub server_message: Option<String>,
    /// Transport error code (e.g. `ERR_NETWORK`)
    pub code: Option<String>,
    /// Set when the request never reached the server
    pub network: bool,
}

impl TransportError {
    /// A non-success HTTP response
    pub fn http(status: u16, server_message: Option<String>) -> Self {
        Self {
            status: Some(status),
            message: format!("Request failed with status code {status}"),
            server_message,
            code: None,
            network: false,
        }
    }

    /// A request that never produced a response
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            server_message: None,
            code: Some(NETWORK_ERROR_CODE.to_string()),
            network: true,
        }
    }

    /// A response whose body could not be decoded
    pub fn decode(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
            server_message: None,
            code: None,
            network: false,
        }
    }

    /// Server message, falling back to the transport message
    #[must_use]
    pub fn best_message(&self) -> &str {
        self.server_message
            .as_deref()
            .filter(|m| !m.is_empty())
            .or_else(|| Some(self.message.as_str()).filter(|m| !m.is_empty()))
            .unwrap_or("An error occurred")
    }

    /// Whether the failure looks like a connection problem
    #[must_use]
    pub fn is_network_failure(&self) -> bool {
        self.network
            || self.status.is_none()
            || self.code.as_deref() == Some(NETWORK_ERROR_CODE)
            || self.best_message().contains(NETWORK_ERROR_MARKER)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {status}: {}", self.best_message()),
            None => write!(f, "{}", self.best_message()),
        }
    }
}

impl std::error::Error for TransportError {}
