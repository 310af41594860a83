//! Log output for the CLI
//!
//! Logs go to stderr unless a log file is configured, in which case they are
//! written through a non-blocking `tracing-appender` writer.

use std::path::Path;
use todo_sync_core::{init_tracing, init_tracing_with_writer, LoggingConfig, ObservabilityError};
use tracing_appender::non_blocking::WorkerGuard;

/// Install the global subscriber
///
/// The returned guard flushes the file writer when dropped and must be held
/// for the lifetime of the program.
///
/// # Errors
/// Returns an error if the log level is invalid or a subscriber is already
/// installed
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>, ObservabilityError> {
    let Some(log_file) = &config.log_file else {
        init_tracing(config)?;
        return Ok(None);
    };

    let directory = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = log_file.file_name().ok_or_else(|| {
        ObservabilityError::TracingInit(format!("Invalid log file path: {}", log_file.display()))
    })?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    init_tracing_with_writer(config, writer)?;
    Ok(Some(guard))
}
