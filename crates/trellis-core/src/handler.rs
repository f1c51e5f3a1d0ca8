//! Route handler trait.

use crate::{Request, Response};

/// A terminal route handler.
///
/// Handlers run after the middleware chain is exhausted and the response is
/// still open. They take no continuation. Returning an error (or panicking)
/// makes the dispatcher answer with an empty 500.
///
/// Any `Fn(&mut Request, &mut Response) -> anyhow::Result<()>` closure is a
/// handler:
///
/// ```rust
/// use trellis_core::{Handler, HttpMethod, Request, Response};
///
/// let greet = |req: &mut Request, res: &mut Response| -> anyhow::Result<()> {
///     let name = req.path_param("name").unwrap_or("world");
///     res.send_text(format!("hello, {name}"));
///     Ok(())
/// };
///
/// let mut req = Request::new(HttpMethod::Get, "/hello").unwrap();
/// let mut res = Response::new();
/// greet.call(&mut req, &mut res).unwrap();
/// assert!(res.is_sent());
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Handles the request.
    fn call(&self, req: &mut Request, res: &mut Response) -> anyhow::Result<()>;
}

impl<F> Handler for F
where
    F: Fn(&mut Request, &mut Response) -> anyhow::Result<()> + Send + Sync + 'static,
{
    fn call(&self, req: &mut Request, res: &mut Response) -> anyhow::Result<()> {
        self(req, res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_router::HttpMethod;

    struct Echo;

    impl Handler for Echo {
        fn call(&self, req: &mut Request, res: &mut Response) -> anyhow::Result<()> {
            res.send_text(req.path());
            Ok(())
        }
    }

    #[test]
    fn test_struct_handler() {
        let mut req = Request::new(HttpMethod::Get, "/a/b").unwrap();
        let mut res = Response::new();
        Echo.call(&mut req, &mut res).unwrap();
        assert_eq!(&res.into_outbound().body[..], b"/a/b");
    }

    #[test]
    fn test_closure_handler_error() {
        let failing = |_: &mut Request, _: &mut Response| -> anyhow::Result<()> {
            anyhow::bail!("boom")
        };
        let mut req = Request::new(HttpMethod::Get, "/").unwrap();
        let mut res = Response::new();
        assert!(failing.call(&mut req, &mut res).is_err());
    }

    #[test]
    fn test_handlers_are_object_safe() {
        let boxed: Box<dyn Handler> = Box::new(Echo);
        let mut req = Request::new(HttpMethod::Get, "/").unwrap();
        let mut res = Response::new();
        boxed.call(&mut req, &mut res).unwrap();
        assert!(res.is_sent());
    }
}
