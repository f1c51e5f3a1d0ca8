//! Configuration sections.
//!
//! Every section rejects unknown fields and fills missing ones with defaults,
//! so a file only needs to mention what it changes.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use trellis_telemetry::LogFormat;

/// `[server]` section.
///
/// ```
/// use trellis_config::ServerSection;
///
/// let section: ServerSection = toml::from_str(r#"http_addr = "127.0.0.1:3000""#).unwrap();
/// assert_eq!(section.http_addr, "127.0.0.1:3000");
/// assert!(section.keep_alive);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Bind address, e.g. `0.0.0.0:8080`.
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Drain window on shutdown, in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Body collection limit, in milliseconds.
    #[serde(default = "default_body_timeout")]
    pub body_timeout_ms: u64,

    /// Header read limit in seconds; absent disables it.
    #[serde(default = "default_header_read_timeout")]
    pub header_read_timeout_secs: Option<u64>,

    /// HTTP/1.1 keep-alive.
    #[serde(default = "default_true")]
    pub keep_alive: bool,

    /// Connection cap; absent means unlimited.
    #[serde(default)]
    pub max_connections: Option<usize>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            body_timeout_ms: default_body_timeout(),
            header_read_timeout_secs: default_header_read_timeout(),
            keep_alive: true,
            max_connections: None,
        }
    }
}

impl From<&ServerSection> for trellis_server::ServerConfig {
    fn from(section: &ServerSection) -> Self {
        trellis_server::ServerConfig::builder()
            .http_addr(section.http_addr.clone())
            .shutdown_timeout(Duration::from_secs(section.shutdown_timeout_secs))
            .body_timeout(Duration::from_millis(section.body_timeout_ms))
            .header_read_timeout(section.header_read_timeout_secs.map(Duration::from_secs))
            .keep_alive(section.keep_alive)
            .max_connections(section.max_connections)
            .build()
    }
}

fn default_http_addr() -> String {
    trellis_server::config::DEFAULT_HTTP_ADDR.to_string()
}

fn default_shutdown_timeout() -> u64 {
    trellis_server::config::DEFAULT_SHUTDOWN_TIMEOUT_SECS
}

fn default_body_timeout() -> u64 {
    trellis_server::config::DEFAULT_BODY_TIMEOUT_SECS * 1000
}

#[allow(clippy::unnecessary_wraps)]
fn default_header_read_timeout() -> Option<u64> {
    Some(trellis_server::config::DEFAULT_HEADER_READ_TIMEOUT_SECS)
}

fn default_true() -> bool {
    true
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Install a subscriber at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// `EnvFilter` directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` or `pretty`.
    #[serde(default)]
    pub format: LogFormat,

    /// Emit span open/close events.
    #[serde(default)]
    pub span_events: bool,

    /// Include file and line.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::Json,
            span_events: false,
            include_location: false,
        }
    }
}

impl From<&LoggingSection> for trellis_telemetry::LogConfig {
    fn from(section: &LoggingSection) -> Self {
        trellis_telemetry::LogConfig {
            enabled: section.enabled,
            level: section.level.clone(),
            format: section.format,
            span_events: section.span_events,
            file_line_info: section.include_location,
            include_target: true,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[metrics]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Install the Prometheus recorder.
    #[serde(default)]
    pub enabled: bool,

    /// Scrape listener address; absent installs the recorder only.
    #[serde(default = "default_metrics_addr")]
    pub addr: Option<String>,

    /// Latency buckets in seconds, strictly increasing.
    #[serde(default = "default_histogram_buckets")]
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: default_metrics_addr(),
            duration_buckets: default_histogram_buckets(),
        }
    }
}

impl From<&MetricsSection> for trellis_telemetry::MetricsConfig {
    fn from(section: &MetricsSection) -> Self {
        trellis_telemetry::MetricsConfig {
            enabled: section.enabled,
            addr: section.addr.clone(),
            duration_buckets: section.duration_buckets.clone(),
        }
    }
}

#[allow(clippy::unnecessary_wraps)]
fn default_metrics_addr() -> Option<String> {
    Some("0.0.0.0:9090".to_string())
}

fn default_histogram_buckets() -> Vec<f64> {
    trellis_telemetry::MetricsConfig::default().duration_buckets
}
