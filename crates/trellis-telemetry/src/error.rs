//! Telemetry error types.

use thiserror::Error;

/// Errors raised while installing logging or metrics.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Metrics recorder or exporter could not be installed.
    #[error("Failed to initialize metrics: {0}")]
    MetricsInit(String),

    /// The global tracing subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// A listen address did not parse.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}
