//! # Trellis Test
//!
//! In-memory testing for Trellis applications. A [`TestClient`] owns a built
//! [`App`](trellis::App) and dispatches requests to it directly, so tests
//! exercise URI parsing, the middleware chain and routing without binding a
//! port.
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use trellis::middleware::stages::JsonBodyParser;
//! use trellis::App;
//! use trellis_test::TestClient;
//!
//! let mut app = App::new();
//! app.use_middleware(JsonBodyParser).post("/users", |req, res| {
//!     let name = req
//!         .body()
//!         .and_then(|b| b.as_json().ok())
//!         .and_then(|j| j.value["name"].as_str().map(str::to_string))
//!         .unwrap_or_default();
//!     res.set_status(201);
//!     res.send_json(&json!({ "created": name }))?;
//!     Ok(())
//! });
//!
//! let client = TestClient::new(app);
//! client
//!     .post("/users")
//!     .json(&json!({ "name": "Alice" }))
//!     .send()
//!     .assert_status(201)
//!     .assert_json_eq(&json!({ "created": "Alice" }));
//! ```

#![doc(html_root_url = "https://docs.rs/trellis-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::TestResponse;
