//! # Trellis Middleware
//!
//! The ordered, prefix-mounted middleware chain.
//!
//! Middleware is registered with a mount pattern. For each request the
//! [`MiddlewareChain`] walks the registrations in order and runs every one
//! whose pattern is a prefix of the request path, until one of them sends
//! the response, halts, or fails.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use trellis_core::{HttpMethod, PathPattern, Request, Response};
//! use trellis_middleware::{next, ChainOutcome, MiddlewareChain, MiddlewareResult};
//!
//! let mut chain = MiddlewareChain::new();
//! chain.push(
//!     PathPattern::parse("/admin"),
//!     Arc::new(|_: &mut Request, res: &mut Response| -> MiddlewareResult {
//!         res.send_error(403);
//!         next()
//!     }),
//! );
//!
//! let mut req = Request::new(HttpMethod::Get, "/admin/users").unwrap();
//! let mut res = Response::new();
//! assert_eq!(chain.run(&mut req, &mut res), ChainOutcome::Sent);
//! assert_eq!(res.status(), 403);
//! ```

#![doc(html_root_url = "https://docs.rs/trellis-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod middleware;
pub mod stages;

pub use chain::{BoxedMiddleware, ChainOutcome, MiddlewareChain};
pub use middleware::{halt, next, Flow, FnMiddleware, Middleware, MiddlewareResult};
