//! # Trellis
//!
//! Express-style routing and middleware dispatch for HTTP services.
//!
//! An application is a list of prefix-mounted middleware followed by a
//! table of per-method routes. Each request walks the middleware in
//! registration order; if none of them sends a response, the first route
//! whose pattern matches the full path runs.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use trellis::prelude::*;
//! use trellis::middleware::stages::{JsonBodyParser, RequestLogger};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut app = App::new();
//!     app.use_middleware(RequestLogger)
//!         .use_at("/api", JsonBodyParser)
//!         .get("/api/users/:id", |req, res| {
//!             let id = req.path_param("id").unwrap_or_default().to_string();
//!             res.send_json(&serde_json::json!({ "id": id }))?;
//!             Ok(())
//!         });
//!
//!     app.listen("0.0.0.0:8080").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Request flow
//!
//! ```text
//! InboundRequest → parse URI → middleware (prefix match, in order) → route (full match) → OutboundResponse
//!                      │                 │                                │
//!                     400          send / halt / error                 404 / 500
//! ```

#![doc(html_root_url = "https://docs.rs/trellis/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod dispatch;
mod error;

pub use app::App;
pub use dispatch::{BoxedHandler, Dispatcher};
pub use error::AppError;

// Re-export the component crates
pub use trellis_config as config;
pub use trellis_core as core;
pub use trellis_middleware as middleware;
pub use trellis_router as router;
pub use trellis_server as server;
pub use trellis_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```rust
/// use trellis::prelude::*;
///
/// let mut app = App::new();
/// app.get("/", |_req, res| {
///     res.send_text("hello");
///     Ok(())
/// });
/// ```
pub mod prelude {
    pub use crate::{App, AppError};

    pub use trellis_core::{
        Body, HandleError, HandleResult, Handler, HttpMethod, InboundRequest, OutboundResponse,
        Params, PathPattern, Request, Response, Service,
    };

    pub use trellis_middleware::{halt, next, FnMiddleware, Middleware, MiddlewareResult};

    pub use trellis_config::{ConfigLoader, TrellisConfig};

    pub use trellis_server::{ServerConfig, ShutdownSignal};
}
