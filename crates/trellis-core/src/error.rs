//! Error types surfaced to the transport adapter.

use thiserror::Error;
use trellis_router::{HttpMethod, InvalidUriError};

/// Result type alias for [`HandleError`].
pub type HandleResult<T> = Result<T, HandleError>;

/// Why a request could not be turned into a response.
///
/// Failures inside middleware and handlers never show up here: those are
/// converted into a 500 response during dispatch.
#[derive(Debug, Error)]
pub enum HandleError {
    /// The request target is malformed; no request context was created.
    #[error(transparent)]
    InvalidUri(#[from] InvalidUriError),

    /// A middleware halted the chain without sending a response.
    #[error("request {method} {path} was left unresolved")]
    Unresolved {
        /// Request method.
        method: HttpMethod,
        /// Normalized request path.
        path: String,
    },
}

impl HandleError {
    /// The status a transport should answer with.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidUri(_) => 400,
            Self::Unresolved { .. } => 500,
        }
    }
}
