//! Request logging middleware.

use crate::middleware::{next, Middleware, MiddlewareResult};
use trellis_core::{Request, Response};

/// Logs each request's method, path and query at `info` level, then continues.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogger;

impl Middleware for RequestLogger {
    fn name(&self) -> &str {
        "request-logger"
    }

    fn handle(&self, req: &mut Request, _res: &mut Response) -> MiddlewareResult {
        tracing::info!(
            method = %req.method(),
            path = %req.path(),
            query_params = req.query_params().len(),
            user_agent = req.header("user-agent").unwrap_or("-"),
            "request received"
        );
        next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::Flow;
    use trellis_core::HttpMethod;

    #[test]
    fn test_logger_continues() {
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::fmt().with_test_writer().finish(),
        );
        let mut req = Request::new(HttpMethod::Get, "/health?verbose").unwrap();
        let mut res = Response::new();

        assert_eq!(RequestLogger.handle(&mut req, &mut res).unwrap(), Flow::Continue);
        assert!(!res.is_sent());
        assert!(res.headers().is_empty());
    }
}
