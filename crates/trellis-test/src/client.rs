//! In-memory test client.

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use trellis::App;
use trellis_core::{HttpMethod, Service};

/// Drives an [`App`] (or any [`Service`]) without a socket.
///
/// Requests go through the same URI parsing, middleware chain and routing as
/// they would behind the server. Dispatch errors are answered the way the
/// server answers them: `400` for a malformed target, `500` for a request no
/// middleware or handler resolved.
///
/// ```rust
/// use trellis::App;
/// use trellis_test::TestClient;
///
/// let mut app = App::new();
/// app.get("/users/:id", |req, res| {
///     res.send_text(req.path_param("id").unwrap_or_default().to_string());
///     Ok(())
/// });
///
/// let client = TestClient::new(app);
/// client.get("/users/42").send().assert_status(200).assert_body_eq("42");
/// client.post("/users/42").send().assert_status(404);
/// ```
#[must_use]
pub struct TestClient {
    service: Arc<dyn Service>,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Wraps a built app.
    pub fn new(app: App) -> Self {
        Self::from_service(app)
    }

    /// Wraps any service.
    pub fn from_service(service: impl Service) -> Self {
        Self {
            service: Arc::new(service),
            default_headers: Vec::new(),
        }
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Starts a `GET` request.
    pub fn get(&self, target: impl Into<String>) -> TestClientRequest<'_> {
        self.request(HttpMethod::Get, target)
    }

    /// Starts a `POST` request.
    pub fn post(&self, target: impl Into<String>) -> TestClientRequest<'_> {
        self.request(HttpMethod::Post, target)
    }

    /// Starts a `PUT` request.
    pub fn put(&self, target: impl Into<String>) -> TestClientRequest<'_> {
        self.request(HttpMethod::Put, target)
    }

    /// Starts a `PATCH` request.
    pub fn patch(&self, target: impl Into<String>) -> TestClientRequest<'_> {
        self.request(HttpMethod::Patch, target)
    }

    /// Starts a `DELETE` request.
    pub fn delete(&self, target: impl Into<String>) -> TestClientRequest<'_> {
        self.request(HttpMethod::Delete, target)
    }

    /// Starts an `OPTIONS` request.
    pub fn options(&self, target: impl Into<String>) -> TestClientRequest<'_> {
        self.request(HttpMethod::Options, target)
    }

    /// Starts a `HEAD` request.
    pub fn head(&self, target: impl Into<String>) -> TestClientRequest<'_> {
        self.request(HttpMethod::Head, target)
    }

    /// Starts a request with any method.
    pub fn request(&self, method: HttpMethod, target: impl Into<String>) -> TestClientRequest<'_> {
        let mut builder = TestRequestBuilder::new(method, target);
        for (name, value) in &self.default_headers {
            builder = builder.header(name, value);
        }
        TestClientRequest {
            client: self,
            builder,
        }
    }
}

impl fmt::Debug for TestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestClient")
            .field("default_headers", &self.default_headers)
            .finish_non_exhaustive()
    }
}

/// A request builder bound to a [`TestClient`].
#[must_use]
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl TestClientRequest<'_> {
    /// Sets a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the `content-type` header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    /// Sets a bearer token.
    pub fn bearer_token(mut self, token: impl AsRef<str>) -> Self {
        self.builder = self.builder.bearer_token(token);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: serde::Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sets a form body.
    pub fn form<T: serde::Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.builder = self.builder.form(value);
        self
    }

    /// Sets a plain-text body.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.builder = self.builder.text(text);
        self
    }

    /// Dispatches the request, answering dispatch errors with their status.
    ///
    /// # Panics
    ///
    /// Panics if the request could not be built (invalid header, body
    /// encoding failure).
    pub fn send(self) -> TestResponse {
        match self.try_send() {
            Ok(response) => response,
            Err(TestError::Dispatch(err)) => TestResponse::status_only(err.status_code()),
            Err(err) => panic!("failed to build test request: {err}"),
        }
    }

    /// Dispatches the request, surfacing dispatch errors.
    pub fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        let response = self.client.service.call(request)?;
        Ok(response.into())
    }
}
