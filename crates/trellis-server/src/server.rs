//! HTTP server.
//!
//! Accepts TCP connections, serves HTTP/1.1 on each with hyper, and feeds
//! every request through a [`Service`]. The service itself is synchronous;
//! this module owns everything that touches the wire.
//!
//! # Architecture
//!
//! - TCP listener bound to the configured address
//! - One spawned task per connection, tracked for graceful shutdown
//! - Optional connection cap: accepting pauses while every slot is taken
//! - Method mapping and body collection (with timeout) before the service runs
//! - [`OutboundResponse`] written back with hyper filling in `content-length`
//!
//! # Example
//!
//! ```rust,ignore
//! use trellis_server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::builder().http_addr("0.0.0.0:8080").build();
//!     Server::new(config, my_service).run().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::{Request, Response, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::ext::ReasonPhrase;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use trellis_core::{Body, HandleError, HttpMethod, InboundRequest, OutboundResponse, Service};
use trellis_telemetry::{record_request, InFlightGuard};

use crate::config::ServerConfig;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Response body type.
pub type ResponseBody = Full<Bytes>;

/// Response type produced by the server.
pub type HttpResponse = Response<ResponseBody>;

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address is invalid or could not be bound.
    #[error("Bind error: {0}")]
    BindError(String),

    /// Listener I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP/1.1 server around a [`Service`].
pub struct Server<S> {
    config: ServerConfig,
    service: Arc<S>,
}

impl<S: Service> Server<S> {
    /// Creates a server; nothing is bound until [`run`](Self::run).
    #[must_use]
    pub fn new(config: ServerConfig, service: S) -> Self {
        Self {
            config,
            service: Arc::new(service),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds the configured address.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let addr = self.config.socket_addr().map_err(|e| {
            ServerError::BindError(format!("Invalid address '{}': {}", self.config.http_addr(), e))
        })?;

        TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(format!("Failed to bind to {addr}: {e}")))
    }

    /// Serves until SIGINT/SIGTERM.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Serves until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }

    /// Serves on an already-bound listener until `shutdown` fires, then waits
    /// up to the shutdown timeout for open connections to finish.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "server listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();
        let slots = server
            .config
            .max_connections()
            .map(|max| Arc::new(Semaphore::new(max.max(1))));

        loop {
            // With a cap configured, hold off accepting until a slot frees up.
            let permit = match &slots {
                Some(slots) => {
                    if slots.available_permits() == 0 {
                        tracing::debug!("connection limit reached, waiting for a slot");
                    }
                    tokio::select! {
                        permit = Arc::clone(slots).acquire_owned() => match permit {
                            Ok(permit) => Some(permit),
                            Err(_) => break,
                        },
                        () = shutdown.recv() => {
                            tracing::info!("shutdown signal received, no longer accepting connections");
                            break;
                        }
                    }
                }
                None => None,
            };

            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let server = Arc::clone(&server);
                            let token = tracker.acquire();
                            let shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(e) = server.handle_connection(stream, remote_addr, shutdown).await {
                                    tracing::debug!(%remote_addr, error = %e, "connection ended with error");
                                }
                                drop(permit);
                                drop(token);
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to accept connection");
                        }
                    }
                }

                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        let shutdown_timeout = server.config.shutdown_timeout();
        tracing::info!(
            timeout = ?shutdown_timeout,
            active = tracker.active_connections(),
            "draining connections"
        );

        tokio::select! {
            _ = tracker.wait_for_shutdown() => {
                tracing::info!("all connections closed");
            }
            _ = tokio::time::sleep(shutdown_timeout) => {
                tracing::warn!(
                    active = tracker.active_connections(),
                    "shutdown timeout reached with connections still open"
                );
            }
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(&self);

        let service = service_fn(move |req: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_request(req).await) }
        });

        let mut builder = http1::Builder::new();
        builder.timer(TokioTimer::new()).keep_alive(self.config.keep_alive());
        if let Some(timeout) = self.config.header_read_timeout() {
            builder.header_read_timeout(timeout);
        }

        let conn = builder.serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            _ = shutdown.recv() => {
                tracing::debug!(%remote_addr, "finishing connection for shutdown");
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    async fn handle_request(&self, req: Request<Incoming>) -> HttpResponse {
        let _in_flight = InFlightGuard::new();
        let start = Instant::now();
        let method_label = req.method().as_str().to_owned();

        let response = self.respond(req).await;

        record_request(&method_label, response.status().as_u16(), start.elapsed());
        response
    }

    async fn respond(&self, req: Request<Incoming>) -> HttpResponse {
        let (parts, body) = req.into_parts();

        let Ok(method) = HttpMethod::try_from(&parts.method) else {
            tracing::warn!(method = %parts.method, uri = %parts.uri, "unsupported method");
            return status_only(StatusCode::NOT_IMPLEMENTED);
        };

        let body = match tokio::time::timeout(self.config.body_timeout(), body.collect()).await {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "failed to read request body");
                return status_only(StatusCode::BAD_REQUEST);
            }
            Err(_) => {
                tracing::warn!(uri = %parts.uri, "request body timed out");
                return status_only(StatusCode::REQUEST_TIMEOUT);
            }
        };

        let inbound = inbound_request(method, &parts.uri, parts.headers, body);
        match self.service.call(inbound) {
            Ok(outbound) => into_http(outbound),
            Err(err) => error_response(&err),
        }
    }
}

/// Builds the record handed to the service.
pub(crate) fn inbound_request(
    method: HttpMethod,
    uri: &Uri,
    headers: http::HeaderMap,
    body: Bytes,
) -> InboundRequest {
    let target = uri.path_and_query().map_or("/", |pq| pq.as_str());
    InboundRequest {
        method,
        target: target.to_string(),
        headers,
        body: (!body.is_empty()).then(|| Body::raw(body)),
    }
}

/// Turns the service's output into a hyper response.
pub(crate) fn into_http(outbound: OutboundResponse) -> HttpResponse {
    let OutboundResponse {
        status,
        message,
        headers,
        body,
    } = outbound;

    let Ok(status) = StatusCode::from_u16(status) else {
        tracing::error!(status, "handler produced an invalid status code");
        return status_only(StatusCode::INTERNAL_SERVER_ERROR);
    };

    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;

    if !message.is_empty() && Some(message.as_str()) != status.canonical_reason() {
        match ReasonPhrase::try_from(message) {
            Ok(reason) => {
                response.extensions_mut().insert(reason);
            }
            Err(_) => tracing::warn!(%status, "ignoring invalid status message"),
        }
    }

    response
}

fn error_response(err: &HandleError) -> HttpResponse {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!(error = %err, "request could not be handled");
    } else {
        tracing::warn!(error = %err, "rejecting request");
    }
    status_only(status)
}

fn status_only(status: StatusCode) -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_inbound_request_keeps_raw_target() {
        let uri: Uri = "/items/7?x=%20y".parse().unwrap();
        let inbound = inbound_request(HttpMethod::Get, &uri, http::HeaderMap::new(), Bytes::new());

        assert_eq!(inbound.method, HttpMethod::Get);
        assert_eq!(inbound.target, "/items/7?x=%20y");
        assert!(inbound.body.is_none());
    }

    #[test]
    fn test_inbound_request_absolute_form() {
        let uri: Uri = "http://example.com/a/b?c=d".parse().unwrap();
        let inbound = inbound_request(HttpMethod::Post, &uri, http::HeaderMap::new(), Bytes::from("x"));

        assert_eq!(inbound.target, "/a/b?c=d");
        assert_eq!(inbound.body.unwrap().serialize(), Bytes::from("x"));
    }

    #[test]
    fn test_into_http_copies_everything() {
        let mut headers = http::HeaderMap::new();
        headers.insert("x-trace", HeaderValue::from_static("abc"));
        let response = into_http(OutboundResponse {
            status: 201,
            message: "Made It".to_string(),
            headers,
            body: Bytes::from_static(b"done"),
        });

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-trace"], "abc");
        assert_eq!(
            response.extensions().get::<ReasonPhrase>().map(ReasonPhrase::as_bytes),
            Some(&b"Made It"[..])
        );
    }

    #[test]
    fn test_into_http_canonical_message_is_not_overridden() {
        let response = into_http(OutboundResponse {
            status: 404,
            message: "Not Found".to_string(),
            headers: http::HeaderMap::new(),
            body: Bytes::new(),
        });
        assert!(response.extensions().get::<ReasonPhrase>().is_none());
    }

    #[test]
    fn test_into_http_invalid_status_becomes_500() {
        let response = into_http(OutboundResponse {
            status: 42,
            message: String::new(),
            headers: http::HeaderMap::new(),
            body: Bytes::from_static(b"ignored"),
        });
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_response_status() {
        let invalid = HandleError::from(trellis_core::Request::new(HttpMethod::Get, "/%zz").unwrap_err());
        assert_eq!(error_response(&invalid).status(), StatusCode::BAD_REQUEST);

        let unresolved = HandleError::Unresolved {
            method: HttpMethod::Get,
            path: "/stuck".to_string(),
        };
        assert_eq!(error_response(&unresolved).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
