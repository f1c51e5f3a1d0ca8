//! Startup errors surfaced by [`App::run`](crate::App::run).

use thiserror::Error;

/// Failure to bring an application up or keep it serving.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration failed validation.
    #[error("configuration error: {0}")]
    Config(#[from] trellis_config::ConfigError),

    /// Logging or metrics could not be installed.
    #[error("telemetry error: {0}")]
    Telemetry(#[from] trellis_telemetry::TelemetryError),

    /// The listener failed.
    #[error("server error: {0}")]
    Server(#[from] trellis_server::ServerError),
}
