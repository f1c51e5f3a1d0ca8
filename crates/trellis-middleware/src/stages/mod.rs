//! Built-in middleware stages.
//!
//! Every stage is an ordinary [`Middleware`](crate::Middleware) and is
//! mounted like any user middleware; nothing here is installed by default.
//!
//! - [`cors`] - CORS headers and preflight answers
//! - [`body_parser`] - Text, form, JSON and binary body parsing
//! - [`request_logger`] - One log line per request
//! - [`serve_static`] - Files from a directory

pub mod body_parser;
pub mod cors;
pub mod request_logger;
pub mod serve_static;

pub use body_parser::{BinaryBodyParser, FormBodyParser, JsonBodyParser, TextBodyParser};
pub use cors::{AllowedOrigins, Cors, CorsBuilder, CorsConfig};
pub use request_logger::RequestLogger;
pub use serve_static::ServeStatic;
