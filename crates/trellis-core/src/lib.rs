//! # Trellis Core
//!
//! Request, response and body types shared by every Trellis crate.
//!
//! - [`Request`] - Per-request context: method, headers, path split, parameters, body
//! - [`Response`] - Response state that freezes once sent
//! - [`Body`] - Tagged union of body kinds with typed accessors
//! - [`Handler`] - Terminal route handler trait
//! - [`Service`] - Inbound-to-outbound seam used by transports
//! - [`HandleError`] - Errors a transport must turn into a status

#![doc(html_root_url = "https://docs.rs/trellis-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod body;
mod error;
mod guard;
mod handler;
mod request;
mod response;
mod service;
mod transport;

pub use body::{
    BinaryBody, Body, BodyKind, BodyParseError, BodyTypeMismatch, FormBody, JsonBody, TextBody,
};
pub use error::{HandleError, HandleResult};
pub use guard::{catch_panic, CallbackPanicked};
pub use handler::Handler;
pub use request::Request;
pub use response::Response;
pub use service::Service;
pub use transport::{InboundRequest, OutboundResponse};

pub use trellis_router::{HttpMethod, InvalidUriError, Params, PathPattern};
