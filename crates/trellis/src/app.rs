//! The application facade.
//!
//! An [`App`] collects middleware and routes during startup and then serves
//! them. Registration methods parse the path once and append; nothing is
//! reordered, so registration order is dispatch order.
//!
//! ```rust
//! use trellis::prelude::*;
//!
//! let mut app = App::new();
//! app.use_fn_at("/api", |_req, res| {
//!     res.set_header("x-api", "1");
//!     next()
//! });
//! app.get("/api/items/:id", |req, res| {
//!     res.send_text(format!("item {}", req.path_param("id").unwrap_or("?")));
//!     Ok(())
//! });
//!
//! let out = app.handle(InboundRequest::new(HttpMethod::Get, "/api/items/7")).unwrap();
//! assert_eq!(out.status, 200);
//! assert_eq!(&out.body[..], b"item 7");
//! ```

use std::sync::Arc;

use trellis_config::TrellisConfig;
use trellis_core::{
    HandleResult, Handler, InboundRequest, OutboundResponse, Request, Response, Service,
};
use trellis_middleware::{Middleware, MiddlewareResult};
use trellis_router::{HttpMethod, PathPattern};
use trellis_server::{Server, ServerConfig, ServerError, ShutdownSignal};

use crate::dispatch::{BoxedHandler, Dispatcher};
use crate::error::AppError;

/// Registration surface and request entry point.
///
/// `listen*` and [`run`](Self::run) consume the app, so nothing can be
/// registered once serving has started.
#[derive(Debug, Default)]
pub struct App {
    dispatcher: Dispatcher,
}

impl App {
    /// Creates an app with no middleware and no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts `middleware` at the root; it sees every request.
    pub fn use_middleware<M: Middleware>(&mut self, middleware: M) -> &mut Self {
        self.dispatcher
            .add_middleware(PathPattern::root(), Arc::new(middleware));
        self
    }

    /// Mounts `middleware` at `path` (prefix match).
    pub fn use_at<M: Middleware>(&mut self, path: &str, middleware: M) -> &mut Self {
        self.dispatcher
            .add_middleware(PathPattern::parse(path), Arc::new(middleware));
        self
    }

    /// Mounts one `middleware` instance at each of `paths`, in order.
    pub fn use_at_paths<M, I, P>(&mut self, paths: I, middleware: M) -> &mut Self
    where
        M: Middleware,
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let shared: Arc<dyn Middleware> = Arc::new(middleware);
        for path in paths {
            self.dispatcher
                .add_middleware(PathPattern::parse(path.as_ref()), Arc::clone(&shared));
        }
        self
    }

    /// Mounts a closure at the root.
    pub fn use_fn<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Request, &mut Response) -> MiddlewareResult + Send + Sync + 'static,
    {
        self.use_middleware(f)
    }

    /// Mounts a closure at `path`.
    pub fn use_fn_at<F>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: Fn(&mut Request, &mut Response) -> MiddlewareResult + Send + Sync + 'static,
    {
        self.use_at(path, f)
    }

    /// Registers `handler` for `method` on `path` (full match).
    pub fn on<H: Handler>(&mut self, method: HttpMethod, path: &str, handler: H) -> &mut Self {
        self.dispatcher
            .add_route(method, PathPattern::parse(path), Arc::new(handler));
        self
    }

    /// Registers one `handler` for `method` on each of `paths`.
    pub fn on_paths<H, I, P>(&mut self, method: HttpMethod, paths: I, handler: H) -> &mut Self
    where
        H: Handler,
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let shared: BoxedHandler = Arc::new(handler);
        for path in paths {
            self.dispatcher
                .add_route(method, PathPattern::parse(path.as_ref()), Arc::clone(&shared));
        }
        self
    }

    /// Registers one `handler` on `path` for each of `methods`.
    pub fn on_methods<H, I>(&mut self, methods: I, path: &str, handler: H) -> &mut Self
    where
        H: Handler,
        I: IntoIterator<Item = HttpMethod>,
    {
        let shared: BoxedHandler = Arc::new(handler);
        let pattern = PathPattern::parse(path);
        for method in methods {
            self.dispatcher
                .add_route(method, pattern.clone(), Arc::clone(&shared));
        }
        self
    }

    /// Registers `handler` on `path` for every supported method.
    pub fn any<F>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Request, &mut Response) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_methods(HttpMethod::ALL, path, handler)
    }

    /// Number of middleware mounts.
    pub fn middleware_count(&self) -> usize {
        self.dispatcher.chain().len()
    }

    /// Number of routes across all methods.
    pub fn route_count(&self) -> usize {
        self.dispatcher.routes().len()
    }

    /// The underlying dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Handles one request end to end.
    ///
    /// Malformed targets are rejected with [`HandleError::InvalidUri`]
    /// before any middleware runs.
    ///
    /// [`HandleError::InvalidUri`]: trellis_core::HandleError::InvalidUri
    pub fn handle(&self, inbound: InboundRequest) -> HandleResult<OutboundResponse> {
        let mut req = Request::from_inbound(inbound)?;
        let mut res = Response::new();
        self.dispatcher.dispatch(&mut req, &mut res)?;
        Ok(res.into_outbound())
    }

    /// Serves on `addr` until SIGINT/SIGTERM.
    pub async fn listen(self, addr: impl Into<String>) -> Result<(), ServerError> {
        let config = ServerConfig::builder().http_addr(addr).build();
        self.listen_with(config).await
    }

    /// Serves with an explicit transport configuration until SIGINT/SIGTERM.
    pub async fn listen_with(self, config: ServerConfig) -> Result<(), ServerError> {
        self.log_startup();
        Server::new(config, self).run().await
    }

    /// Serves until `shutdown` fires.
    pub async fn listen_with_shutdown(
        self,
        config: ServerConfig,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        self.log_startup();
        Server::new(config, self).run_with_shutdown(shutdown).await
    }

    /// Validates `config`, installs logging and metrics, then serves until
    /// SIGINT/SIGTERM.
    pub async fn run(self, config: TrellisConfig) -> Result<(), AppError> {
        config.validate()?;
        trellis_telemetry::init_telemetry(&config.telemetry_config())?;
        self.listen_with(config.server_config()).await?;
        Ok(())
    }

    fn log_startup(&self) {
        tracing::info!(
            middleware = self.middleware_count(),
            routes = self.route_count(),
            "starting application"
        );
    }
}

impl Service for App {
    fn call(&self, request: InboundRequest) -> HandleResult<OutboundResponse> {
        self.handle(request)
    }
}

macro_rules! verb_methods {
    ($($name:ident => $method:ident),* $(,)?) => {
        impl App {
            $(
                #[doc = concat!("Registers a `", stringify!($method), "` route.")]
                pub fn $name<F>(&mut self, path: &str, handler: F) -> &mut Self
                where
                    F: Fn(&mut Request, &mut Response) -> anyhow::Result<()> + Send + Sync + 'static,
                {
                    self.on(HttpMethod::$method, path, handler)
                }
            )*
        }
    };
}

verb_methods! {
    get => Get,
    post => Post,
    put => Put,
    delete => Delete,
    patch => Patch,
    options => Options,
    head => Head,
}
