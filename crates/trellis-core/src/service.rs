//! The seam between the routing core and a transport.

use crate::error::HandleError;
use crate::transport::{InboundRequest, OutboundResponse};
use std::sync::Arc;

/// Something that turns an inbound request into an outbound response.
///
/// Implementations must be safe to call from many transport tasks at once;
/// all per-request state lives inside the call.
pub trait Service: Send + Sync + 'static {
    /// Handles one request end to end.
    fn call(&self, request: InboundRequest) -> Result<OutboundResponse, HandleError>;
}

impl<S: Service + ?Sized> Service for Arc<S> {
    fn call(&self, request: InboundRequest) -> Result<OutboundResponse, HandleError> {
        (**self).call(request)
    }
}

impl<S: Service + ?Sized> Service for Box<S> {
    fn call(&self, request: InboundRequest) -> Result<OutboundResponse, HandleError> {
        (**self).call(request)
    }
}
