//! Body-parsing middleware.
//!
//! Requests arrive with a [`Body::Raw`] body. Each parser here looks at the
//! `content-type` header and, when it recognizes the type, replaces the raw
//! body with a typed one. Bodies that were already parsed by an earlier
//! stage are left alone, so several parsers can be mounted side by side.
//!
//! Content types are compared without parameters and case-insensitively:
//! `Application/JSON; charset=utf-8` is `application/json`.

use crate::middleware::{halt, next, Middleware, MiddlewareResult};
use bytes::Bytes;
use std::collections::BTreeSet;
use trellis_core::body::{FORM_CONTENT_TYPE, JSON_CONTENT_TYPE, TEXT_CONTENT_TYPE};
use trellis_core::{BinaryBody, Body, FormBody, JsonBody, Request, Response, TextBody};

/// Content types [`TextBodyParser`] accepts by default.
pub const TEXT_TYPES: &[&str] = &[
    "text/plain",
    "text/html",
    "text/css",
    "text/javascript",
    "text/csv",
    "text/xml",
    "text/markdown",
    "application/xml",
    "application/xhtml+xml",
    "application/javascript",
    "application/json",
];

/// Returns the request's media type: lower-cased, parameters stripped.
pub fn media_type(req: &Request) -> Option<String> {
    req.header("content-type").map(|value| {
        value
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    })
}

/// Takes the raw bytes out of the request if the body is still unparsed.
fn raw_bytes(req: &Request) -> Option<Bytes> {
    req.body().and_then(|body| body.as_raw().ok()).cloned()
}

/// Parses textual bodies into [`TextBody`].
#[derive(Debug, Clone)]
pub struct TextBodyParser {
    types: BTreeSet<String>,
    forced: bool,
}

impl Default for TextBodyParser {
    fn default() -> Self {
        Self {
            types: TEXT_TYPES.iter().map(|t| (*t).to_string()).collect(),
            forced: false,
        }
    }
}

impl TextBodyParser {
    /// Parser for the default [`TEXT_TYPES`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser that treats every raw body as text, whatever its type.
    ///
    /// The declared type is kept; bodies without one become `text/plain`.
    pub fn forced() -> Self {
        Self {
            types: BTreeSet::new(),
            forced: true,
        }
    }

    /// Adds another accepted media type.
    #[must_use]
    pub fn with_type(mut self, media_type: impl Into<String>) -> Self {
        self.types.insert(media_type.into().to_ascii_lowercase());
        self
    }
}

impl Middleware for TextBodyParser {
    fn name(&self) -> &str {
        "text-body-parser"
    }

    fn handle(&self, req: &mut Request, _res: &mut Response) -> MiddlewareResult {
        let Some(bytes) = raw_bytes(req) else {
            return next();
        };
        let content_type = match media_type(req) {
            Some(t) if self.forced || self.types.contains(&t) => t,
            None if self.forced => TEXT_CONTENT_TYPE.to_string(),
            _ => return next(),
        };
        req.set_body(TextBody::parse_from(&bytes, content_type));
        next()
    }
}

/// Parses `application/x-www-form-urlencoded` bodies into [`FormBody`].
///
/// A malformed payload is answered with `400 Bad Request`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormBodyParser;

impl Middleware for FormBodyParser {
    fn name(&self) -> &str {
        "form-body-parser"
    }

    fn handle(&self, req: &mut Request, res: &mut Response) -> MiddlewareResult {
        if media_type(req).as_deref() != Some(FORM_CONTENT_TYPE) {
            return next();
        }
        let Some(bytes) = raw_bytes(req) else {
            return next();
        };
        match FormBody::parse_from(&bytes) {
            Ok(form) => {
                req.set_body(form);
                next()
            }
            Err(err) => {
                tracing::debug!(error = %err, "rejecting malformed form body");
                res.send_error(400);
                halt()
            }
        }
    }
}

/// Parses `application/json` bodies into [`JsonBody`].
///
/// Invalid JSON is answered with `400 Bad Request`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBodyParser;

impl Middleware for JsonBodyParser {
    fn name(&self) -> &str {
        "json-body-parser"
    }

    fn handle(&self, req: &mut Request, res: &mut Response) -> MiddlewareResult {
        if media_type(req).as_deref() != Some(JSON_CONTENT_TYPE) {
            return next();
        }
        let Some(bytes) = raw_bytes(req) else {
            return next();
        };
        match JsonBody::parse_from(&bytes) {
            Ok(json) => {
                req.set_body(json);
                next()
            }
            Err(err) => {
                tracing::debug!(error = %err, "rejecting malformed JSON body");
                res.send_error(400);
                halt()
            }
        }
    }
}

/// Wraps raw bodies in [`BinaryBody`], recording the declared type.
///
/// With no type filter every raw body that has a `content-type` is wrapped.
#[derive(Debug, Clone, Default)]
pub struct BinaryBodyParser {
    types: BTreeSet<String>,
}

impl BinaryBodyParser {
    /// Parser that accepts any declared type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser that only accepts the given media types.
    pub fn for_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: types
                .into_iter()
                .map(|t| t.into().to_ascii_lowercase())
                .collect(),
        }
    }
}

impl Middleware for BinaryBodyParser {
    fn name(&self) -> &str {
        "binary-body-parser"
    }

    fn handle(&self, req: &mut Request, _res: &mut Response) -> MiddlewareResult {
        let Some(content_type) = media_type(req) else {
            return next();
        };
        if !self.types.is_empty() && !self.types.contains(&content_type) {
            return next();
        }
        if let Some(bytes) = raw_bytes(req) {
            req.set_body(Body::Binary(BinaryBody::parse_from(bytes, content_type)));
        }
        next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::Flow;
    use http::{HeaderMap, HeaderValue};
    use serde_json::json;
    use trellis_core::{BodyKind, HttpMethod, InboundRequest};

    fn request(content_type: Option<&'static str>, body: &'static [u8]) -> Request {
        let mut map = HeaderMap::new();
        if let Some(t) = content_type {
            map.insert("content-type", HeaderValue::from_static(t));
        }
        let inbound = InboundRequest::new(HttpMethod::Post, "/upload")
            .with_headers(map)
            .with_raw_body(body);
        Request::from_inbound(inbound).unwrap()
    }

    fn run(mw: &dyn Middleware, req: &mut Request) -> (Flow, Response) {
        let mut res = Response::new();
        let flow = mw.handle(req, &mut res).unwrap();
        (flow, res)
    }

    #[test]
    fn test_media_type_normalization() {
        let req = request(Some("Application/JSON ; charset=utf-8"), b"");
        assert_eq!(media_type(&req).as_deref(), Some("application/json"));
        assert_eq!(media_type(&request(None, b"")), None);
    }

    #[test]
    fn test_text_parser() {
        let mut req = request(Some("text/html; charset=utf-8"), b"<p>hi</p>");
        let (flow, _) = run(&TextBodyParser::new(), &mut req);
        assert_eq!(flow, Flow::Continue);

        let text = req.body().unwrap().as_text().unwrap();
        assert_eq!(text.text, "<p>hi</p>");
        assert_eq!(text.content_type(), "text/html");
    }

    #[test]
    fn test_text_parser_skips_unknown_types() {
        let mut req = request(Some("image/png"), b"\x89PNG");
        run(&TextBodyParser::new(), &mut req);
        assert_eq!(req.body().map(Body::kind), Some(BodyKind::Raw));

        let mut req = request(Some("image/x-custom"), b"abc");
        run(&TextBodyParser::new().with_type("Image/X-Custom"), &mut req);
        assert_eq!(req.body().map(Body::kind), Some(BodyKind::Text));
    }

    #[test]
    fn test_forced_text_parser() {
        let mut req = request(None, b"anything");
        run(&TextBodyParser::forced(), &mut req);
        let text = req.body().unwrap().as_text().unwrap();
        assert_eq!(text.content_type(), "text/plain");

        let mut req = request(Some("image/png"), b"bytes");
        run(&TextBodyParser::forced(), &mut req);
        assert_eq!(req.body().unwrap().content_type(), "image/png");
    }

    #[test]
    fn test_form_parser() {
        let mut req = request(Some("application/x-www-form-urlencoded"), b"a=1&b=two+words");
        let (flow, _) = run(&FormBodyParser, &mut req);
        assert_eq!(flow, Flow::Continue);

        let form = req.body().unwrap().as_form().unwrap();
        assert_eq!(form.get("a"), Some("1"));
        assert_eq!(form.get("b"), Some("two words"));
    }

    #[test]
    fn test_json_parser() {
        let mut req = request(Some("application/json"), br#"{"name":"trellis"}"#);
        let (flow, res) = run(&JsonBodyParser, &mut req);
        assert_eq!(flow, Flow::Continue);
        assert!(!res.is_sent());
        assert_eq!(req.body().unwrap().as_json().unwrap().value, json!({"name": "trellis"}));
    }

    #[test]
    fn test_json_parser_rejects_invalid_json() {
        let mut req = request(Some("application/json"), b"{not json");
        let (flow, res) = run(&JsonBodyParser, &mut req);
        assert_eq!(flow, Flow::Halt);
        assert_eq!(res.status(), 400);
        assert!(res.is_sent());
    }

    #[test]
    fn test_parsers_leave_parsed_bodies_alone() {
        let mut req = request(Some("application/json"), br#"[1,2]"#);
        run(&TextBodyParser::new(), &mut req);
        run(&JsonBodyParser, &mut req);
        assert_eq!(req.body().map(Body::kind), Some(BodyKind::Text));
    }

    #[test]
    fn test_parsers_without_body() {
        let mut req = Request::new(HttpMethod::Get, "/").unwrap();
        let (flow, _) = run(&TextBodyParser::forced(), &mut req);
        assert_eq!(flow, Flow::Continue);
        assert!(req.body().is_none());
    }

    #[test]
    fn test_binary_parser() {
        let mut req = request(Some("image/png"), b"\x89PNG");
        run(&BinaryBodyParser::new(), &mut req);
        let binary = req.body().unwrap().as_binary().unwrap();
        assert_eq!(binary.content_type(), "image/png");
        assert_eq!(&binary.data[..], b"\x89PNG");
    }

    #[test]
    fn test_binary_parser_type_filter() {
        let mut req = request(Some("application/pdf"), b"%PDF");
        run(&BinaryBodyParser::for_types(["image/png"]), &mut req);
        assert_eq!(req.body().map(Body::kind), Some(BodyKind::Raw));
    }
}
