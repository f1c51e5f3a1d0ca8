//! Turning panics in user callbacks into ordinary errors.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// A middleware or handler panicked.
#[derive(Debug, thiserror::Error)]
#[error("callback panicked: {message}")]
pub struct CallbackPanicked {
    /// The panic payload, if it was a string.
    pub message: String,
}

/// Runs `f`, converting a panic into a [`CallbackPanicked`] error.
///
/// The request and response borrowed by `f` may be left half-mutated; the
/// caller is expected to overwrite the response with an error status.
pub fn catch_panic<T>(f: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(CallbackPanicked {
            message: panic_message(payload.as_ref()).to_string(),
        }
        .into()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic payload>"
    }
}
