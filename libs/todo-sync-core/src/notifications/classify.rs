use crate::error::{TodoError, TransportError};
use serde::{Deserialize, Serialize};

const CONNECTION_ERROR: &str =
    "Unable to connect to the server. Please check your internet connection.";
const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

/// Anything that can go wrong, as seen by the classifier
#[derive(Debug, Clone, Copy)]
pub enum Failure<'a> {
    /// Structured failure from the remote todo service
    Transport(&'a TransportError),
    /// Any other error value
    Error(&'a (dyn std::error::Error + 'a)),
    /// A bare message
    Message(&'a str),
    /// Nothing usable
    Unknown,
}

impl<'a> From<&'a TransportError> for Failure<'a> {
    fn from(error: &'a TransportError) -> Self {
        Self::Transport(error)
    }
}

impl<'a> From<&'a TodoError> for Failure<'a> {
    fn from(error: &'a TodoError) -> Self {
        match error {
            TodoError::Transport(transport) => Self::Transport(transport),
            other => Self::Error(other),
        }
    }
}

impl<'a> From<&'a str> for Failure<'a> {
    fn from(message: &'a str) -> Self {
        Self::Message(message)
    }
}

/// Message and title shown to the user for a failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorNotice {
    pub message: String,
    pub title: String,
}

impl ErrorNotice {
    fn new(message: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            title: title.into(),
        }
    }
}

fn classify_transport(error: &TransportError) -> ErrorNotice {
    let message = error.best_message();
    match error.status {
        Some(400) => ErrorNotice::new(format!("Invalid request: {message}"), "Error 400"),
        Some(401) => ErrorNotice::new(
            "You must be logged in to perform this action",
            "Unauthorized",
        ),
        Some(403) => ErrorNotice::new(
            "You don't have the necessary permissions",
            "Access Denied",
        ),
        Some(404) => ErrorNotice::new(
            "The requested resource was not found",
            "Resource Not Found",
        ),
        Some(500 | 502 | 503) => ErrorNotice::new(
            "The server encountered an error. Please try again later.",
            "Server Error",
        ),
        Some(status) if !error.is_network_failure() => {
            ErrorNotice::new(message, format!("Error {status}"))
        }
        _ => ErrorNotice::new(CONNECTION_ERROR, "Connection Error"),
    }
}

/// Map a failure to the message/title pair shown to the user
///
/// Always produces exactly one notice.
#[must_use]
pub fn classify_failure(failure: Failure<'_>) -> ErrorNotice {
    match failure {
        Failure::Transport(error) => classify_transport(error),
        Failure::Error(error) => {
            let message = error.to_string();
            if message.is_empty() {
                ErrorNotice::new(UNEXPECTED_ERROR, "Error")
            } else {
                ErrorNotice::new(message, "Error")
            }
        }
        Failure::Message(message) => ErrorNotice::new(message, "Error"),
        Failure::Unknown => ErrorNotice::new(UNEXPECTED_ERROR, "Error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(status: u16) -> ErrorNotice {
        classify_failure(Failure::Transport(&TransportError::http(status, None)))
    }

    #[test]
    fn test_bad_request_uses_server_message() {
        let error = TransportError::http(400, Some("Title is required".to_string()));
        let notice = classify_failure((&error).into());
        assert_eq!(notice.message, "Invalid request: Title is required");
        assert_eq!(notice.title, "Error 400");
    }

    #[test]
    fn test_bad_request_without_server_message() {
        let notice = transport(400);
        assert_eq!(
            notice.message,
            "Invalid request: Request failed with status code 400"
        );
    }

    #[test]
    fn test_status_table() {
        assert_eq!(transport(401).title, "Unauthorized");
        assert_eq!(transport(403).title, "Access Denied");
        assert_eq!(transport(404).title, "Resource Not Found");
        assert_eq!(
            transport(404).message,
            "The requested resource was not found"
        );
        for status in [500, 502, 503] {
            assert_eq!(transport(status).title, "Server Error");
        }
    }

    #[test]
    fn test_network_failure() {
        let error = TransportError::network("error sending request: connection refused");
        let notice = classify_failure(Failure::Transport(&error));
        assert_eq!(notice.title, "Connection Error");
        assert_eq!(notice.message, CONNECTION_ERROR);
    }

    #[test]
    fn test_network_marker_on_other_status() {
        let mut error = TransportError::http(418, Some("Network Error".to_string()));
        error.network = false;
        let notice = classify_failure(Failure::Transport(&error));
        assert_eq!(notice.title, "Connection Error");
    }

    #[test]
    fn test_other_status_keeps_message() {
        let error = TransportError::http(409, Some("Conflict on title".to_string()));
        let notice = classify_failure(Failure::Transport(&error));
        assert_eq!(notice.message, "Conflict on title");
        assert_eq!(notice.title, "Error 409");
    }

    #[test]
    fn test_todo_error_conversion() {
        let error = TodoError::from(TransportError::http(404, None));
        assert_eq!(classify_failure((&error).into()).title, "Resource Not Found");

        let error = TodoError::missing_id("delete");
        let notice = classify_failure((&error).into());
        assert_eq!(notice.message, "Cannot delete a todo without an ID");
        assert_eq!(notice.title, "Error");
    }

    #[test]
    fn test_generic_error() {
        let error = std::io::Error::other("disk on fire");
        let notice = classify_failure(Failure::Error(&error));
        assert_eq!(notice.message, "disk on fire");
        assert_eq!(notice.title, "Error");
    }

    #[test]
    fn test_plain_string() {
        let notice = classify_failure("boom".into());
        assert_eq!(notice.message, "boom");
        assert_eq!(notice.title, "Error");
    }

    #[test]
    fn test_unknown() {
        let notice = classify_failure(Failure::Unknown);
        assert_eq!(notice.message, "An unexpected error occurred");
        assert_eq!(notice.title, "Error");
    }
}
