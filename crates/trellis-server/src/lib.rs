//! # Trellis Server
//!
//! The transport adapter: a hyper 1 / tokio HTTP/1.1 server that turns wire
//! requests into [`InboundRequest`](trellis_core::InboundRequest)s, runs them
//! through a [`Service`](trellis_core::Service), and writes the resulting
//! [`OutboundResponse`](trellis_core::OutboundResponse).
//!
//! - Methods outside the supported set are answered with 501
//! - Bodies are collected under a timeout and handed over as raw bytes
//! - A non-default status message becomes the reason phrase
//! - Graceful shutdown on SIGINT/SIGTERM or a programmatic [`ShutdownSignal`]
//! - Request counts and latency are recorded through `trellis-telemetry`

#![doc(html_root_url = "https://docs.rs/trellis-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod server;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use server::{HttpResponse, Server, ServerError};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
