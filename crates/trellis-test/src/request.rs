//! Test request building.

use crate::error::TestError;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use trellis_core::{HttpMethod, InboundRequest};

/// Builder for an [`InboundRequest`].
///
/// Builder methods never panic. The first invalid header or body encoding
/// failure is kept and reported by [`build`](Self::build).
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: HttpMethod,
    target: String,
    headers: HeaderMap,
    body: Option<Bytes>,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a builder for `method` on `target`.
    ///
    /// `target` is passed through as the raw request target, so it may carry
    /// a query string and percent-escapes.
    pub fn new(method: HttpMethod, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            headers: HeaderMap::new(),
            body: None,
            error: None,
        }
    }

    /// Sets a header, replacing any previous value.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        let parsed = HeaderName::try_from(name).map_err(|e| format!("{name}: {e}"));
        let value = parsed.and_then(|header_name| {
            HeaderValue::try_from(value.as_ref())
                .map(|v| (header_name, v))
                .map_err(|e| format!("{name}: {e}"))
        });
        match value {
            Ok((name, value)) => {
                self.headers.insert(name, value);
            }
            Err(reason) => self.fail(TestError::InvalidHeader(reason)),
        }
        self
    }

    /// Sets the `content-type` header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the `authorization` header to a bearer token.
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        self.header(
            header::AUTHORIZATION.as_str(),
            format!("Bearer {}", token.as_ref()),
        )
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets a JSON body and `content-type: application/json`.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.body = Some(Bytes::from(bytes));
                self.content_type("application/json")
            }
            Err(e) => {
                self.fail(TestError::Json(e));
                self
            }
        }
    }

    /// Sets a form body and `content-type: application/x-www-form-urlencoded`.
    pub fn form<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_urlencoded::to_string(value) {
            Ok(encoded) => {
                self.body = Some(Bytes::from(encoded));
                self.content_type("application/x-www-form-urlencoded")
            }
            Err(e) => {
                self.fail(TestError::Body(e.to_string()));
                self
            }
        }
    }

    /// Sets a plain-text body and `content-type: text/plain`.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.body = Some(Bytes::from(text.into()));
        self.content_type("text/plain")
    }

    /// Builds the inbound record, or returns the first recorded error.
    pub fn build(self) -> Result<InboundRequest, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let mut request = InboundRequest::new(self.method, self.target).with_headers(self.headers);
        if let Some(body) = self.body.filter(|b| !b.is_empty()) {
            request = request.with_raw_body(body);
        }
        Ok(request)
    }

    fn fail(&mut self, error: TestError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_request() {
        let request = TestRequestBuilder::new(HttpMethod::Get, "/users?page=2")
            .build()
            .unwrap();
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.target, "/users?page=2");
        assert!(request.headers.is_empty());
        assert!(request.body.is_none());
    }

    #[test]
    fn test_header_names_are_lowercased() {
        let request = TestRequestBuilder::new(HttpMethod::Get, "/")
            .header("X-Request-Id", "abc")
            .bearer_token("t0k")
            .build()
            .unwrap();
        assert_eq!(request.headers.get("x-request-id").unwrap(), "abc");
        assert_eq!(request.headers.get("authorization").unwrap(), "Bearer t0k");
    }

    #[test]
    fn test_invalid_header_is_reported_at_build() {
        let result = TestRequestBuilder::new(HttpMethod::Get, "/")
            .header("bad header", "x")
            .header("x-ok", "fine")
            .build();
        assert!(matches!(result, Err(TestError::InvalidHeader(_))));
    }

    #[test]
    fn test_json_body() {
        let request = TestRequestBuilder::new(HttpMethod::Post, "/users")
            .json(&json!({"name": "Alice"}))
            .build()
            .unwrap();
        assert_eq!(request.headers.get("content-type").unwrap(), "application/json");
        let body = request.body.unwrap();
        assert_eq!(&body.as_raw().unwrap()[..], b"{\"name\":\"Alice\"}");
    }

    #[test]
    fn test_form_body() {
        let request = TestRequestBuilder::new(HttpMethod::Post, "/login")
            .form(&[("user", "ada"), ("note", "a b")])
            .build()
            .unwrap();
        assert_eq!(
            request.headers.get("content-type").unwrap(),
            "application/x-www-form-urlencoded"
        );
        assert_eq!(&request.body.unwrap().serialize()[..], b"user=ada&note=a+b");
    }

    #[test]
    fn test_empty_body_is_absent() {
        let request = TestRequestBuilder::new(HttpMethod::Post, "/")
            .body(Bytes::new())
            .build()
            .unwrap();
        assert!(request.body.is_none());
    }
}
