//! The top-level [`TrellisConfig`].

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::schema::{LogFormat, LoggingSection, MetricsSection, ServerSection};
use crate::ConfigError;

/// Complete service configuration.
///
/// ```toml
/// [server]
/// http_addr = "0.0.0.0:8080"
/// body_timeout_ms = 10000
///
/// [logging]
/// level = "info,trellis_middleware=debug"
/// format = "json"
///
/// [metrics]
/// enabled = true
/// addr = "0.0.0.0:9090"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct TrellisConfig {
    /// Transport settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Metrics settings.
    #[serde(default)]
    pub metrics: MetricsSection,
}

impl TrellisConfig {
    /// Debug-level pretty logging with source locations.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;
        config
    }

    /// JSON logging at `info` with metrics enabled.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.metrics.enabled = true;
        config
    }

    /// Checks cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.body_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.body_timeout_ms",
                "must be greater than zero",
            ));
        }

        if self.server.max_connections == Some(0) {
            return Err(ConfigError::invalid_value(
                "server.max_connections",
                "must be greater than zero",
            ));
        }

        if self.logging.enabled {
            trellis_telemetry::logging::create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }

        if self.metrics.enabled {
            if let Some(addr) = &self.metrics.addr {
                if addr.parse::<SocketAddr>().is_err() {
                    return Err(ConfigError::invalid_value(
                        "metrics.addr",
                        format!("invalid socket address: {addr}"),
                    ));
                }
            }
        }

        let buckets = &self.metrics.duration_buckets;
        if buckets.is_empty() || buckets.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::invalid_value(
                "metrics.duration_buckets",
                "must be non-empty and strictly increasing",
            ));
        }

        Ok(())
    }

    /// Transport configuration for [`trellis_server::Server`].
    #[must_use]
    pub fn server_config(&self) -> trellis_server::ServerConfig {
        (&self.server).into()
    }

    /// Logging and metrics settings for [`trellis_telemetry::init_telemetry`].
    #[must_use]
    pub fn telemetry_config(&self) -> trellis_telemetry::TelemetryConfig {
        trellis_telemetry::TelemetryConfig {
            logging: (&self.logging).into(),
            metrics: (&self.metrics).into(),
        }
    }
}
