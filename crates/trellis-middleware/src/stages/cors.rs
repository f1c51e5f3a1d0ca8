//! CORS (Cross-Origin Resource Sharing) middleware.
//!
//! For every request that carries an allowed `Origin`, the CORS headers are
//! set on the response before the chain continues, so they survive into
//! whatever response a later middleware or handler sends. A preflight
//! `OPTIONS` request from an allowed origin is answered right away with
//! `204 No Content`.
//!
//! Requests without an `Origin`, or from an origin that is not allowed, pass
//! through untouched.
//!
//! ## Example
//!
//! ```rust
//! use trellis_middleware::stages::Cors;
//! use trellis_core::HttpMethod;
//!
//! let cors = Cors::builder()
//!     .allow_origin("https://app.example.com")
//!     .allow_methods([HttpMethod::Get, HttpMethod::Post])
//!     .allow_headers(["Content-Type", "Authorization"])
//!     .allow_credentials(true)
//!     .build();
//! ```

use crate::middleware::{next, Middleware, MiddlewareResult};
use std::collections::BTreeSet;
use std::time::Duration;
use trellis_core::{HttpMethod, Request, Response};

/// CORS header names.
pub mod headers {
    /// `Access-Control-Allow-Origin` header.
    pub const ALLOW_ORIGIN: &str = "access-control-allow-origin";
    /// `Access-Control-Allow-Methods` header.
    pub const ALLOW_METHODS: &str = "access-control-allow-methods";
    /// `Access-Control-Allow-Headers` header.
    pub const ALLOW_HEADERS: &str = "access-control-allow-headers";
    /// `Access-Control-Allow-Credentials` header.
    pub const ALLOW_CREDENTIALS: &str = "access-control-allow-credentials";
    /// `Access-Control-Max-Age` header.
    pub const MAX_AGE: &str = "access-control-max-age";
    /// `Access-Control-Expose-Headers` header.
    pub const EXPOSE_HEADERS: &str = "access-control-expose-headers";
    /// `Origin` header.
    pub const ORIGIN: &str = "origin";
    /// `Vary` header.
    pub const VARY: &str = "vary";
}

/// The set of allowed origins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    /// Allow any origin.
    Any,
    /// Allow only these origins.
    List(BTreeSet<String>),
}

impl AllowedOrigins {
    /// Checks if an origin is allowed.
    pub fn is_allowed(&self, origin: &str) -> bool {
        match self {
            AllowedOrigins::Any => true,
            AllowedOrigins::List(origins) => origins.contains(origin),
        }
    }
}

/// Configuration for [`Cors`].
///
/// Empty method and header lists mean the corresponding header is not sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    /// Which origins get CORS headers.
    pub allowed_origins: AllowedOrigins,
    /// Methods advertised in `Access-Control-Allow-Methods`.
    pub allowed_methods: Vec<HttpMethod>,
    /// Headers advertised in `Access-Control-Allow-Headers`.
    pub allowed_headers: Vec<String>,
    /// Headers advertised in `Access-Control-Expose-Headers`.
    pub expose_headers: Vec<String>,
    /// Whether to send `Access-Control-Allow-Credentials: true`.
    pub allow_credentials: bool,
    /// Preflight cache lifetime.
    pub max_age: Option<Duration>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: AllowedOrigins::Any,
            allowed_methods: Vec::new(),
            allowed_headers: Vec::new(),
            expose_headers: Vec::new(),
            allow_credentials: false,
            max_age: None,
        }
    }
}

/// Builder for [`Cors`].
#[derive(Debug, Clone, Default)]
pub struct CorsBuilder {
    config: CorsConfig,
}

impl CorsBuilder {
    /// Creates a builder that allows any origin and advertises nothing else.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows any origin.
    #[must_use]
    pub fn allow_any_origin(mut self) -> Self {
        self.config.allowed_origins = AllowedOrigins::Any;
        self
    }

    /// Adds an allowed origin, switching from "any" to an explicit list.
    #[must_use]
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        let mut origins = match std::mem::replace(&mut self.config.allowed_origins, AllowedOrigins::Any) {
            AllowedOrigins::Any => BTreeSet::new(),
            AllowedOrigins::List(origins) => origins,
        };
        origins.insert(origin.into());
        self.config.allowed_origins = AllowedOrigins::List(origins);
        self
    }

    /// Sets the advertised methods.
    #[must_use]
    pub fn allow_methods<I>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = HttpMethod>,
    {
        self.config.allowed_methods = methods.into_iter().collect();
        self
    }

    /// Sets the advertised request headers.
    #[must_use]
    pub fn allow_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Sets headers exposed to scripts.
    #[must_use]
    pub fn expose_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.expose_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Sets whether credentials are allowed.
    #[must_use]
    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.config.allow_credentials = allow;
        self
    }

    /// Sets the preflight cache lifetime.
    #[must_use]
    pub fn max_age(mut self, duration: Duration) -> Self {
        self.config.max_age = Some(duration);
        self
    }

    /// Builds the middleware.
    #[must_use]
    pub fn build(self) -> Cors {
        Cors::new(self.config)
    }
}

/// CORS middleware.
#[derive(Debug, Clone, Default)]
pub struct Cors {
    config: CorsConfig,
}

impl Cors {
    /// Creates the middleware from a config.
    pub fn new(config: CorsConfig) -> Self {
        Self { config }
    }

    /// Creates a builder.
    #[must_use]
    pub fn builder() -> CorsBuilder {
        CorsBuilder::new()
    }

    /// The active configuration.
    pub fn config(&self) -> &CorsConfig {
        &self.config
    }

    fn apply_headers(&self, res: &mut Response, origin: &str) {
        let config = &self.config;

        // A wildcard origin cannot be combined with credentials, so echo it.
        if config.allowed_origins == AllowedOrigins::Any && !config.allow_credentials {
            res.set_header(headers::ALLOW_ORIGIN, "*");
        } else {
            res.set_header(headers::ALLOW_ORIGIN, origin);
            res.set_header(headers::VARY, "Origin");
        }

        if !config.allowed_methods.is_empty() {
            let methods: Vec<&str> = config.allowed_methods.iter().map(|m| m.as_str()).collect();
            res.set_header(headers::ALLOW_METHODS, &methods.join(","));
        }

        if !config.allowed_headers.is_empty() {
            res.set_header(headers::ALLOW_HEADERS, &config.allowed_headers.join(","));
        }

        if !config.expose_headers.is_empty() {
            res.set_header(headers::EXPOSE_HEADERS, &config.expose_headers.join(","));
        }

        if config.allow_credentials {
            res.set_header(headers::ALLOW_CREDENTIALS, "true");
        }
    }
}

impl Middleware for Cors {
    fn name(&self) -> &str {
        "cors"
    }

    fn handle(&self, req: &mut Request, res: &mut Response) -> MiddlewareResult {
        let Some(origin) = req.header(headers::ORIGIN) else {
            return next();
        };

        if !self.config.allowed_origins.is_allowed(origin) {
            tracing::debug!(origin, "origin not allowed, skipping CORS headers");
            return next();
        }

        self.apply_headers(res, origin);

        if req.method() == HttpMethod::Options {
            if let Some(max_age) = self.config.max_age {
                res.set_header(headers::MAX_AGE, &max_age.as_secs().to_string());
            }
            res.set_status(204).clear_body().send();
        }

        next()
    }
}
