//! # Trellis Telemetry
//!
//! Logging and metrics for Trellis services.
//!
//! - **Logging**: `tracing-subscriber` with JSON or pretty output and an
//!   `EnvFilter` level directive ([`logging`])
//! - **Metrics**: Prometheus exposition through the `metrics` facade
//!   ([`metrics`]); the server records request counts and latency
//!
//! # Example
//!
//! ```rust,ignore
//! use trellis_telemetry::{init_telemetry, LogConfig, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_telemetry(&TelemetryConfig {
//!         logging: LogConfig::development(),
//!         ..Default::default()
//!     })?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/trellis-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use metrics::{init_metrics, record_request, render_metrics, InFlightGuard, MetricsConfig};

/// Result alias for telemetry setup.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Combined logging and metrics settings.
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    /// Logging settings.
    pub logging: LogConfig,
    /// Metrics settings.
    pub metrics: MetricsConfig,
}

/// Installs logging, then metrics.
///
/// Metrics with a scrape address must be initialized from inside a tokio
/// runtime.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}
