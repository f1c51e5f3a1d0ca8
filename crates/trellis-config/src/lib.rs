//! Typed, layered configuration for Trellis services.
//!
//! - TOML and JSON files
//! - `PREFIX__SECTION__FIELD` environment overrides (and `.env` files)
//! - Strict parsing: unknown sections and fields are errors
//! - Validation after all layers are applied
//!
//! # Example
//!
//! ```no_run
//! use trellis_config::ConfigLoader;
//!
//! # fn main() -> Result<(), trellis_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("trellis.toml")?
//!     .with_dotenv()
//!     .with_env_prefix("TRELLIS")
//!     .load()?;
//!
//! println!("listening on {}", config.server.http_addr);
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/trellis-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::TrellisConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{LogFormat, LoggingSection, MetricsSection, ServerSection};
