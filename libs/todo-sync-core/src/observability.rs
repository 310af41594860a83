//! Structured logging setup and optional metrics
//!
//! Logging always goes through `tracing`. With the `observability` feature
//! the synchronization layer and notification center also record `metrics`
//! counters; without it the recording helpers compile to nothing.

use crate::config::LoggingConfig;
use thiserror::Error;
use tracing::{info, Level};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Error types for observability setup
#[derive(Error, Debug)]
pub enum ObservabilityError {
    #[error("Failed to initialize tracing: {0}")]
    TracingInit(String),
}

/// Result type for observability operations
pub type Result<T> = std::result::Result<T, ObservabilityError>;

/// Build the env filter, preferring `RUST_LOG` over the configured level
fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    config
        .level
        .parse::<Level>()
        .map_err(|e| ObservabilityError::TracingInit(format!("Invalid log level: {e}")))?;

    Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level)))
}

/// Install a global subscriber writing to stderr
///
/// # Errors
/// Returns an error if the level is invalid or a global subscriber is
/// already installed
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    init_tracing_with_writer(config, std::io::stderr)
}

/// Install a global subscriber writing to the given writer
///
/// # Errors
/// Returns an error if the level is invalid or a global subscriber is
/// already installed
pub fn init_tracing_with_writer<W>(config: &LoggingConfig, writer: W) -> Result<()>
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let registry = tracing_subscriber::registry().with(env_filter(config)?);

    let result = if config.json_logs {
        let json_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(writer);
        registry.with(json_layer).try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(writer);
        registry.with(fmt_layer).try_init()
    };

    result.map_err(|e| ObservabilityError::TracingInit(e.to_string()))?;
    info!("Tracing initialized with level: {}", config.level);
    Ok(())
}

#[cfg(feature = "observability")]
pub(crate) fn record_mutation(operation: &'static str, outcome: &'static str) {
    metrics::counter!("todo_mutations_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
}

#[cfg(not(feature = "observability"))]
pub(crate) fn record_mutation(_operation: &'static str, _outcome: &'static str) {}

#[cfg(feature = "observability")]
pub(crate) fn record_notification(kind: &'static str, suppressed: bool) {
    if suppressed {
        metrics::counter!("todo_notifications_suppressed_total", "type" => kind).increment(1);
    } else {
        metrics::counter!("todo_notifications_shown_total", "type" => kind).increment(1);
    }
}

#[cfg(not(feature = "observability"))]
pub(crate) fn record_notification(_kind: &'static str, _suppressed: bool) {}
