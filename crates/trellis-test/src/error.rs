//! Test error types.

use thiserror::Error;
use trellis_core::HandleError;

/// Errors that can occur while building or sending a test request.
#[derive(Debug, Error)]
pub enum TestError {
    /// A header name or value was rejected.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The body could not be encoded, or a response body could not be read.
    #[error("Body error: {0}")]
    Body(String),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The app rejected the request before producing a response.
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] HandleError),
}
