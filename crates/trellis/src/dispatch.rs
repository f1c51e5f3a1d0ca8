//! Request dispatch: the middleware chain followed by route lookup.

use std::fmt;
use std::sync::Arc;

use trellis_core::{catch_panic, HandleError, HandleResult, Handler, Request, Response};
use trellis_middleware::{BoxedMiddleware, ChainOutcome, MiddlewareChain};
use trellis_router::{HttpMethod, PathPattern, RouteTable};

/// A type-erased route handler.
pub type BoxedHandler = Arc<dyn Handler>;

/// Registered middleware and routes.
///
/// Built during startup, then only read. [`dispatch`](Self::dispatch) takes
/// `&self`, so one dispatcher serves any number of concurrent requests
/// without locking.
#[derive(Default)]
pub struct Dispatcher {
    chain: MiddlewareChain,
    routes: RouteTable<BoxedHandler>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("chain", &self.chain)
            .field("routes", &self.routes.len())
            .finish()
    }
}

impl Dispatcher {
    /// Creates an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware mounted at `pattern`.
    pub fn add_middleware(&mut self, pattern: PathPattern, middleware: BoxedMiddleware) {
        self.chain.push(pattern, middleware);
    }

    /// Appends a route for `method`.
    pub fn add_route(&mut self, method: HttpMethod, pattern: PathPattern, handler: BoxedHandler) {
        self.routes.insert(method, pattern, handler);
    }

    /// The middleware chain.
    pub fn chain(&self) -> &MiddlewareChain {
        &self.chain
    }

    /// The route table.
    pub fn routes(&self) -> &RouteTable<BoxedHandler> {
        &self.routes
    }

    /// Runs the chain, then the router if the chain was exhausted.
    ///
    /// On return the response is sent, except when a middleware halted
    /// without sending; that case is reported as [`HandleError::Unresolved`].
    pub fn dispatch(&self, req: &mut Request, res: &mut Response) -> HandleResult<()> {
        match self.chain.run(req, res) {
            ChainOutcome::Sent => Ok(()),
            ChainOutcome::Exhausted => {
                self.route(req, res);
                Ok(())
            }
            ChainOutcome::Halted { by } => {
                tracing::error!(
                    middleware = %by,
                    method = %req.method(),
                    path = %req.path(),
                    "middleware halted without sending a response"
                );
                Err(HandleError::Unresolved {
                    method: req.method(),
                    path: req.path(),
                })
            }
        }
    }

    /// Runs the first route whose pattern matches the whole path, or sends 404.
    fn route(&self, req: &mut Request, res: &mut Response) {
        let Some(found) = self.routes.find(req.method(), req.path_segments()) else {
            tracing::warn!(
                method = %req.method(),
                path = %req.path(),
                allowed = ?self.routes.allowed_methods(req.path_segments()),
                "no route matched"
            );
            res.send_error(404);
            return;
        };

        req.apply_match(found.pattern.len(), found.params);
        tracing::debug!(route = %found.pattern, method = %req.method(), "running handler");

        match catch_panic(|| found.handler.call(req, res)) {
            Ok(()) => res.send(),
            Err(err) => {
                tracing::error!(route = %found.pattern, error = %err, "handler failed");
                if !res.is_sent() {
                    res.send_error(500);
                }
            }
        }
    }
}
