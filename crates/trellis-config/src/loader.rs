//! Layered configuration loading.
//!
//! Layers apply in order: defaults (or a preset), then a TOML or JSON file,
//! then environment overrides named `PREFIX__SECTION__FIELD`, and finally
//! validation.

use std::env;
use std::fs;
use std::path::Path;

use crate::schema::LogFormat;
use crate::{ConfigError, TrellisConfig};

/// Builder that assembles a [`TrellisConfig`] from several sources.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: TrellisConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Starts from [`TrellisConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets to defaults.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = TrellisConfig::default();
        self
    }

    /// Resets to [`TrellisConfig::development`].
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = TrellisConfig::development();
        self
    }

    /// Resets to [`TrellisConfig::production`].
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = TrellisConfig::production();
        self
    }

    /// Loads a `.toml` or `.json` file. The file replaces the current layer;
    /// fields it leaves out take their defaults.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        self.config = parse(&content, &format).map_err(|e| match e {
            ConfigError::ValidationError(_) => ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            )),
            other => other,
        })?;

        Ok(self)
    }

    /// Like [`with_file`](Self::with_file) but a missing file is skipped.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration text in the given format (`toml` or `json`).
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, &format.to_lowercase())?;
        Ok(self)
    }

    /// Enables environment overrides under `prefix`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Loads `.env` into the process environment if one exists.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        // a missing .env is not an error
        let _ = dotenvy::dotenv();
        self
    }

    /// Applies environment overrides from the process environment and validates.
    pub fn load(self) -> Result<TrellisConfig, ConfigError> {
        self.load_with_env(env::vars())
    }

    /// Applies overrides from `vars` instead of the process environment.
    pub fn load_with_env<I>(mut self, vars: I) -> Result<TrellisConfig, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        if let Some(prefix) = self.env_prefix.take() {
            let marker = format!("{prefix}__");
            for (key, value) in vars {
                if let Some(path) = key.strip_prefix(&marker) {
                    self.apply_env_var(&key, path, &value)?;
                }
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the current layer without env overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> TrellisConfig {
        self.config
    }

    fn apply_env_var(&mut self, key: &str, path: &str, value: &str) -> Result<(), ConfigError> {
        let parts: Vec<&str> = path.split("__").collect();
        let server = &mut self.config.server;
        let logging = &mut self.config.logging;
        let metrics = &mut self.config.metrics;

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => server.http_addr = value.to_string(),
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                server.shutdown_timeout_secs = parse_number(key, value)?;
            }
            ["SERVER", "BODY_TIMEOUT_MS"] => server.body_timeout_ms = parse_number(key, value)?,
            ["SERVER", "HEADER_READ_TIMEOUT_SECS"] => {
                server.header_read_timeout_secs = parse_optional_number(key, value)?;
            }
            ["SERVER", "KEEP_ALIVE"] => server.keep_alive = parse_bool_var(key, value)?,
            ["SERVER", "MAX_CONNECTIONS"] => {
                server.max_connections = parse_optional_number(key, value)?;
            }

            ["LOGGING", "ENABLED"] => logging.enabled = parse_bool_var(key, value)?,
            ["LOGGING", "LEVEL"] => logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "SPAN_EVENTS"] => logging.span_events = parse_bool_var(key, value)?,
            ["LOGGING", "INCLUDE_LOCATION"] => {
                logging.include_location = parse_bool_var(key, value)?;
            }

            ["METRICS", "ENABLED"] => metrics.enabled = parse_bool_var(key, value)?,
            ["METRICS", "ADDR"] => {
                metrics.addr = (!value.is_empty() && !value.eq_ignore_ascii_case("none"))
                    .then(|| value.to_string());
            }
            ["METRICS", "DURATION_BUCKETS"] => {
                metrics.duration_buckets = value
                    .split(',')
                    .map(|b| b.trim().parse::<f64>())
                    .collect::<Result<_, _>>()
                    .map_err(|_| {
                        ConfigError::env_parse_error(key, "expected comma-separated numbers")
                    })?;
            }

            [section @ ("SERVER" | "LOGGING" | "METRICS"), field] => {
                return Err(ConfigError::unknown_field(
                    field.to_lowercase(),
                    section.to_lowercase(),
                ));
            }
            _ => {
                return Err(ConfigError::unknown_field(path.to_lowercase(), "(root)"));
            }
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<TrellisConfig, ConfigError> {
    match format {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        _ => Err(ConfigError::validation_error(format!(
            "unsupported configuration format: {format}"
        ))),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_bool_var(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

fn parse_optional_number<T: std::str::FromStr>(
    key: &str,
    value: &str,
) -> Result<Option<T>, ConfigError> {
    if value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer or 'none'"))
}
