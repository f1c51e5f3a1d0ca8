//! Response state.
//!
//! A [`Response`] is mutable until [`Response::send`] is called. From then on
//! it is frozen: every mutator, including `send` itself, is a silent no-op.

use crate::body::Body;
use crate::transport::OutboundResponse;
use bytes::Bytes;
use http::header::{CONTENT_TYPE, LOCATION};
use http::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

/// A response being built by middleware and handlers.
///
/// # Example
///
/// ```rust
/// use trellis_core::Response;
///
/// let mut res = Response::new();
/// res.set_status(201);
/// res.send_text("created");
///
/// res.set_status(500);
/// assert_eq!(res.status(), 201);
/// assert!(res.is_sent());
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    message: String,
    headers: HeaderMap,
    body: Option<Body>,
    sent: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            message: String::new(),
            headers: HeaderMap::new(),
            body: None,
            sent: false,
        }
    }
}

impl Response {
    /// A fresh `200` response with no headers and no body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Status message; empty unless set.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The body, if any.
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Whether the response has been sent and is now frozen.
    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Sets the status code.
    pub fn set_status(&mut self, status: u16) -> &mut Self {
        if !self.sent {
            self.status = status;
        }
        self
    }

    /// Sets the status message.
    pub fn set_message(&mut self, message: impl Into<String>) -> &mut Self {
        if !self.sent {
            self.message = message.into();
        }
        self
    }

    /// Sets a header, replacing any previous value for the same name.
    ///
    /// Names that are not valid header tokens and values that contain
    /// control characters are ignored.
    pub fn set_header(&mut self, name: &str, value: &str) -> &mut Self {
        if self.sent {
            return self;
        }
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "ignoring invalid response header"),
        }
        self
    }

    /// Removes a header.
    pub fn remove_header(&mut self, name: &str) -> &mut Self {
        if !self.sent {
            self.headers.remove(name);
        }
        self
    }

    /// Replaces the body and sets `content-type` to the body's type.
    pub fn set_body(&mut self, body: impl Into<Body>) -> &mut Self {
        if self.sent {
            return self;
        }
        let body = body.into();
        let content_type = body.content_type().to_string();
        self.body = Some(body);
        self.set_header(CONTENT_TYPE.as_str(), &content_type)
    }

    /// Drops the body and its `content-type`.
    pub fn clear_body(&mut self) -> &mut Self {
        if !self.sent {
            self.body = None;
            self.headers.remove(CONTENT_TYPE);
        }
        self
    }

    /// Freezes the response. Calling it again has no effect.
    pub fn send(&mut self) {
        self.sent = true;
    }

    /// Sets `status`, drops the body and sends.
    pub fn send_error(&mut self, status: u16) {
        self.set_status(status).clear_body().send();
    }

    /// Sets a `text/plain` body and sends.
    pub fn send_text(&mut self, text: impl Into<String>) {
        self.set_body(Body::text(text)).send();
    }

    /// Serializes `value` as a JSON body and sends.
    ///
    /// On a serialization error the response is left untouched and unsent.
    pub fn send_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), serde_json::Error> {
        if self.sent {
            return Ok(());
        }
        let body = Body::json(value)?;
        self.set_body(body).send();
        Ok(())
    }

    /// Sends a `302 Found` redirect to `location`.
    pub fn redirect(&mut self, location: &str) {
        self.redirect_with(302, location);
    }

    /// Sends a redirect with a specific status.
    pub fn redirect_with(&mut self, status: u16, location: &str) {
        self.set_status(status)
            .set_header(LOCATION.as_str(), location)
            .clear_body()
            .send();
    }

    /// Converts the response into the record handed to the transport.
    pub fn into_outbound(self) -> OutboundResponse {
        OutboundResponse {
            status: self.status,
            message: self.message,
            headers: self.headers,
            body: self.body.as_ref().map_or_else(Bytes::new, Body::serialize),
        }
    }
}
