//! Core middleware trait and types.
//!
//! A middleware inspects and mutates the [`Request`] and [`Response`], then
//! tells the chain what to do next by returning a [`MiddlewareResult`]:
//!
//! - `Ok(Flow::Continue)` resumes the chain after this middleware.
//! - `Ok(Flow::Halt)` stops the chain. The middleware is expected to have
//!   sent the response; if it did not, the request is left unresolved.
//! - `Err(_)` stops the chain and sends an empty 500.
//!
//! Sending the response also stops the chain, whatever is returned.
//!
//! # Example
//!
//! ```rust
//! use trellis_middleware::{next, Middleware, MiddlewareResult};
//! use trellis_core::{Request, Response};
//!
//! struct PoweredBy;
//!
//! impl Middleware for PoweredBy {
//!     fn name(&self) -> &str {
//!         "powered-by"
//!     }
//!
//!     fn handle(&self, _req: &mut Request, res: &mut Response) -> MiddlewareResult {
//!         res.set_header("x-powered-by", "trellis");
//!         next()
//!     }
//! }
//! ```

use std::fmt;
use trellis_core::{Request, Response};

/// What the chain should do after a middleware returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Resume with the next matching middleware.
    Continue,
    /// Stop dispatching this request.
    Halt,
}

/// The value every middleware returns.
pub type MiddlewareResult = anyhow::Result<Flow>;

/// Continue with the next matching middleware.
#[inline]
pub fn next() -> MiddlewareResult {
    Ok(Flow::Continue)
}

/// Stop the chain.
#[inline]
pub fn halt() -> MiddlewareResult {
    Ok(Flow::Halt)
}

/// The core middleware trait.
///
/// Middleware is registered once at startup and shared by every request,
/// so implementations must be `Send + Sync`.
pub trait Middleware: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str {
        "anonymous"
    }

    /// Processes the request.
    fn handle(&self, req: &mut Request, res: &mut Response) -> MiddlewareResult;
}

impl<F> Middleware for F
where
    F: Fn(&mut Request, &mut Response) -> MiddlewareResult + Send + Sync + 'static,
{
    fn handle(&self, req: &mut Request, res: &mut Response) -> MiddlewareResult {
        self(req, res)
    }
}

/// A closure with a name attached, for nicer logs.
pub struct FnMiddleware<F> {
    name: String,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: Fn(&mut Request, &mut Response) -> MiddlewareResult + Send + Sync + 'static,
{
    /// Wraps `func` under `name`.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut Request, &mut Response) -> MiddlewareResult + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, req: &mut Request, res: &mut Response) -> MiddlewareResult {
        (self.func)(req, res)
    }
}
