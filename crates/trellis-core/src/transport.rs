//! Records exchanged with the transport adapter.
//!
//! The core never touches sockets. A transport hands it an
//! [`InboundRequest`] and gets back an [`OutboundResponse`].

use crate::body::Body;
use bytes::Bytes;
use http::HeaderMap;
use trellis_router::HttpMethod;

/// A request as parsed by the transport.
///
/// Header names in an [`HeaderMap`] are always lower-case.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    /// The request method.
    pub method: HttpMethod,
    /// The raw request target, still percent-encoded.
    pub target: String,
    /// Request headers.
    pub headers: HeaderMap,
    /// The request body, if the transport received one.
    pub body: Option<Body>,
}

impl InboundRequest {
    /// Creates a request with no headers and no body.
    pub fn new(method: HttpMethod, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Sets the headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Attaches raw body bytes as [`Body::Raw`].
    #[must_use]
    pub fn with_raw_body(mut self, bytes: impl Into<Bytes>) -> Self {
        self.body = Some(Body::raw(bytes));
        self
    }
}

/// A finished response, ready for the wire.
///
/// The transport adds `content-length` and supplies a default reason phrase
/// when `message` is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundResponse {
    /// Status code.
    pub status: u16,
    /// Status message; may be empty.
    pub message: String,
    /// Response headers.
    pub headers: HeaderMap,
    /// Serialized body.
    pub body: Bytes,
}
