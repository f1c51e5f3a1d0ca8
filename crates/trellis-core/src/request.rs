//! Per-request context.
//!
//! A [`Request`] carries the facts parsed from the transport (method, raw
//! target, headers, query) plus state derived while dispatch proceeds: the
//! split of the path into a matched base and an unmatched relative part,
//! and the accumulated path parameters.
//!
//! The full normalized path never changes. Each match moves the split
//! point, so base and relative segments always concatenate to the full
//! path.

use crate::body::Body;
use crate::transport::InboundRequest;
use http::HeaderMap;
use trellis_router::{build_path, parse_uri, HttpMethod, InvalidUriError, Params};

/// A request being dispatched.
#[derive(Debug)]
pub struct Request {
    method: HttpMethod,
    raw_uri: String,
    headers: HeaderMap,
    segments: Vec<String>,
    base_len: usize,
    path_params: Params,
    query_params: Params,
    body: Option<Body>,
}

impl Request {
    /// Parses the target of an inbound request and builds the context.
    ///
    /// Fails before any context exists if the target is malformed.
    pub fn from_inbound(inbound: InboundRequest) -> Result<Self, InvalidUriError> {
        let parsed = parse_uri(&inbound.target)?;
        let base_len = parsed.segments.len();
        Ok(Self {
            method: inbound.method,
            raw_uri: inbound.target,
            headers: inbound.headers,
            segments: parsed.segments,
            base_len,
            path_params: Params::new(),
            query_params: parsed.query,
            body: inbound.body,
        })
    }

    /// Shorthand for a request with no headers and no body.
    pub fn new(method: HttpMethod, target: &str) -> Result<Self, InvalidUriError> {
        Self::from_inbound(InboundRequest::new(method, target))
    }

    /// The request method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// The request target exactly as received.
    pub fn raw_uri(&self) -> &str {
        &self.raw_uri
    }

    /// All request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value if it is present and valid visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The full normalized path, decoded.
    pub fn path_segments(&self) -> &[String] {
        &self.segments
    }

    /// The full normalized path as a string.
    pub fn path(&self) -> String {
        build_path(&self.segments)
    }

    /// Segments matched by the most recent pattern.
    pub fn base_segments(&self) -> &[String] {
        &self.segments[..self.base_len]
    }

    /// Segments left after the most recent pattern.
    pub fn relative_segments(&self) -> &[String] {
        &self.segments[self.base_len..]
    }

    /// [`Self::base_segments`] as a path string.
    pub fn base_path(&self) -> String {
        build_path(self.base_segments())
    }

    /// [`Self::relative_segments`] as a path string.
    pub fn relative_path(&self) -> String {
        build_path(self.relative_segments())
    }

    /// Accumulated path parameters.
    pub fn path_params(&self) -> &Params {
        &self.path_params
    }

    /// A single path parameter.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name)
    }

    /// Query parameters, decoded once at parse time.
    pub fn query_params(&self) -> &Params {
        &self.query_params
    }

    /// A single query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name)
    }

    /// Records a pattern match covering the first `matched_len` segments.
    ///
    /// `params` are merged into the path parameters, replacing earlier
    /// bindings of the same name. `matched_len` is clamped to the path.
    pub fn apply_match(&mut self, matched_len: usize, params: Params) {
        self.base_len = matched_len.min(self.segments.len());
        self.path_params.merge(params);
    }

    /// The body, if any.
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Mutable access to the body.
    pub fn body_mut(&mut self) -> Option<&mut Body> {
        self.body.as_mut()
    }

    /// Replaces the body; the previous one is dropped.
    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.body = Some(body.into());
    }

    /// Moves the body out, leaving none.
    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyKind;
    use http::HeaderValue;

    #[test]
    fn test_from_inbound() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("text/plain"));
        let inbound = InboundRequest::new(HttpMethod::Post, "/items/./7?x=1%202")
            .with_headers(headers)
            .with_raw_body("hello");

        let req = Request::from_inbound(inbound).unwrap();
        assert_eq!(req.method(), HttpMethod::Post);
        assert_eq!(req.raw_uri(), "/items/./7?x=1%202");
        assert_eq!(req.path_segments(), &["items", "7"]);
        assert_eq!(req.path(), "/items/7");
        assert_eq!(req.query_param("x"), Some("1 2"));
        assert_eq!(req.header("content-type"), Some("text/plain"));
        assert_eq!(req.header("Content-Type"), Some("text/plain"));
        assert_eq!(req.body().map(Body::kind), Some(BodyKind::Raw));
    }

    #[test]
    fn test_from_inbound_rejects_bad_target() {
        assert!(Request::new(HttpMethod::Get, "/%G0").is_err());
    }

    #[test]
    fn test_initial_split_is_all_base() {
        let req = Request::new(HttpMethod::Get, "/a/b").unwrap();
        assert_eq!(req.base_path(), "/a/b");
        assert_eq!(req.relative_path(), "/");
        assert!(req.relative_segments().is_empty());
    }

    #[test]
    fn test_apply_match_moves_split_and_merges_params() {
        let mut req = Request::new(HttpMethod::Get, "/users/42/posts/9").unwrap();

        req.apply_match(2, Params::from([("id", "42")]));
        assert_eq!(req.base_segments(), &["users", "42"]);
        assert_eq!(req.relative_segments(), &["posts", "9"]);
        assert_eq!(req.relative_path(), "/posts/9");

        req.apply_match(4, Params::from([("post", "9")]));
        assert_eq!(req.path_param("id"), Some("42"));
        assert_eq!(req.path_param("post"), Some("9"));
        assert!(req.relative_segments().is_empty());

        req.apply_match(0, Params::from([("id", "override")]));
        assert_eq!(req.base_path(), "/");
        assert_eq!(req.path_param("id"), Some("override"));
    }

    #[test]
    fn test_base_and_relative_concatenate_to_full_path() {
        let mut req = Request::new(HttpMethod::Get, "/a/b/c").unwrap();
        for len in 0..=5 {
            req.apply_match(len, Params::new());
            let mut joined = req.base_segments().to_vec();
            joined.extend_from_slice(req.relative_segments());
            assert_eq!(joined, req.path_segments());
        }
    }

    #[test]
    fn test_body_is_single_owner() {
        let mut req = Request::new(HttpMethod::Post, "/").unwrap();
        assert!(req.body().is_none());

        req.set_body(Body::raw("one"));
        req.set_body(Body::text("two"));
        assert_eq!(req.body().map(Body::kind), Some(BodyKind::Text));

        let taken = req.take_body().unwrap();
        assert_eq!(&taken.serialize()[..], b"two");
        assert!(req.body().is_none());
    }
}
