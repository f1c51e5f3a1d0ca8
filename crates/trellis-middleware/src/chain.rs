//! Ordered middleware chain.
//!
//! The chain is an explicit loop over an index into the registered mounts.
//! The index only moves forward: each step scans from the current position
//! for the first mount whose pattern prefix-matches the request path, runs
//! it, and resumes after it. Registration order is dispatch priority.
//!
//! ```text
//!  mounts:   [ /       ] [ /a      ] [ /b ] [ /a/:id ]
//!  request:  /a/7
//!            ──run──────  ──run────   skip   ──run────  → Exhausted
//! ```

use crate::middleware::{Flow, Middleware};
use std::fmt;
use std::sync::Arc;
use trellis_core::{catch_panic, Request, Response};
use trellis_router::PathPattern;

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// How a chain run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOutcome {
    /// No further middleware matched; routing should take over.
    Exhausted,
    /// The response was sent, by a middleware or by the chain after a failure.
    Sent,
    /// A middleware halted without sending.
    Halted {
        /// Name of the middleware that halted.
        by: String,
    },
}

struct Mount {
    pattern: PathPattern,
    middleware: BoxedMiddleware,
}

/// Middleware in registration order, each with its mount pattern.
#[derive(Default)]
pub struct MiddlewareChain {
    mounts: Vec<Mount>,
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.mounts
                    .iter()
                    .map(|m| format!("{} {}", m.pattern, m.middleware.name())),
            )
            .finish()
    }
}

impl MiddlewareChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware mounted at `pattern`.
    pub fn push(&mut self, pattern: PathPattern, middleware: BoxedMiddleware) {
        self.mounts.push(Mount {
            pattern,
            middleware,
        });
    }

    /// Number of mounts.
    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    /// Returns true if nothing is mounted.
    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    /// Mount patterns in registration order.
    pub fn patterns(&self) -> impl Iterator<Item = &PathPattern> {
        self.mounts.iter().map(|m| &m.pattern)
    }

    /// Runs every matching middleware in order until one stops the chain.
    ///
    /// Before each middleware runs, the request's path split is moved to the
    /// end of the matched prefix and the prefix's parameters are merged into
    /// the path parameters. A middleware that fails or panics gets the
    /// response replaced with an empty 500 unless it was already sent.
    pub fn run(&self, req: &mut Request, res: &mut Response) -> ChainOutcome {
        let mut index = 0;

        loop {
            if res.is_sent() {
                return ChainOutcome::Sent;
            }

            let Some(mount) = self.next_match(&mut index, req) else {
                return ChainOutcome::Exhausted;
            };

            let params = mount.pattern.extract_params(req.path_segments());
            req.apply_match(mount.pattern.len(), params);

            let name = mount.middleware.name();
            tracing::debug!(
                middleware = name,
                mount = %mount.pattern,
                relative = %req.relative_path(),
                "running middleware"
            );

            match catch_panic(|| mount.middleware.handle(req, res)) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Halt) => {
                    if res.is_sent() {
                        return ChainOutcome::Sent;
                    }
                    tracing::debug!(middleware = name, "middleware halted without sending");
                    return ChainOutcome::Halted {
                        by: name.to_string(),
                    };
                }
                Err(err) => {
                    tracing::error!(middleware = name, error = %err, "middleware failed");
                    if !res.is_sent() {
                        res.send_error(500);
                    }
                    return ChainOutcome::Sent;
                }
            }
        }
    }

    fn next_match(&self, index: &mut usize, req: &Request) -> Option<&Mount> {
        let path = req.path_segments();
        let offset = self.mounts[*index..]
            .iter()
            .position(|m| m.pattern.matches_prefix(path))?;
        let position = *index + offset;
        *index = position + 1;
        self.mounts.get(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{halt, next, FnMiddleware, MiddlewareResult};
    use std::sync::Mutex;
    use trellis_core::HttpMethod;

    fn recorder(
        log: &Arc<Mutex<Vec<String>>>,
        label: &'static str,
    ) -> BoxedMiddleware {
        let log = Arc::clone(log);
        Arc::new(FnMiddleware::new(label, move |req: &mut Request, _: &mut Response| {
            log.lock().unwrap().push(format!("{label}:{}", req.relative_path()));
            next()
        }))
    }

    fn run(chain: &MiddlewareChain, target: &str) -> (Request, Response, ChainOutcome) {
        let mut req = Request::new(HttpMethod::Get, target).unwrap();
        let mut res = Response::new();
        let outcome = chain.run(&mut req, &mut res);
        (req, res, outcome)
    }

    #[test]
    fn test_empty_chain_is_exhausted() {
        let chain = MiddlewareChain::new();
        let (_, res, outcome) = run(&chain, "/anything");
        assert_eq!(outcome, ChainOutcome::Exhausted);
        assert!(!res.is_sent());
    }

    #[test]
    fn test_runs_matching_mounts_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        chain.push(PathPattern::root(), recorder(&log, "root"));
        chain.push(PathPattern::parse("/a"), recorder(&log, "a"));
        chain.push(PathPattern::parse("/b"), recorder(&log, "b"));
        chain.push(PathPattern::parse("/a/b"), recorder(&log, "ab"));

        let (_, _, outcome) = run(&chain, "/a/b/c");
        assert_eq!(outcome, ChainOutcome::Exhausted);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["root:/a/b/c", "a:/b/c", "ab:/c"]
        );
    }

    #[test]
    fn test_halt_without_send_is_reported() {
        let mut chain = MiddlewareChain::new();
        chain.push(
            PathPattern::root(),
            Arc::new(FnMiddleware::new("gate", |_: &mut Request, _: &mut Response| halt())),
        );
        let log = Arc::new(Mutex::new(Vec::new()));
        chain.push(PathPattern::root(), recorder(&log, "after"));

        let (_, res, outcome) = run(&chain, "/");
        assert_eq!(
            outcome,
            ChainOutcome::Halted {
                by: "gate".to_string()
            }
        );
        assert!(!res.is_sent());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_send_stops_chain_even_when_continuing() {
        let mut chain = MiddlewareChain::new();
        chain.push(
            PathPattern::root(),
            Arc::new(|_: &mut Request, res: &mut Response| -> MiddlewareResult {
                res.send_text("early");
                next()
            }),
        );
        let log = Arc::new(Mutex::new(Vec::new()));
        chain.push(PathPattern::root(), recorder(&log, "late"));

        let (_, res, outcome) = run(&chain, "/");
        assert_eq!(outcome, ChainOutcome::Sent);
        assert_eq!(res.status(), 200);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_error_sends_empty_500() {
        let mut chain = MiddlewareChain::new();
        chain.push(
            PathPattern::root(),
            Arc::new(|_: &mut Request, res: &mut Response| -> MiddlewareResult {
                res.set_status(201).set_body("partial");
                Err(anyhow::anyhow!("nope"))
            }),
        );

        let (_, res, outcome) = run(&chain, "/");
        assert_eq!(outcome, ChainOutcome::Sent);
        assert_eq!(res.status(), 500);
        assert!(res.body().is_none());
        assert!(res.is_sent());
    }

    #[test]
    fn test_error_after_send_keeps_response() {
        let mut chain = MiddlewareChain::new();
        chain.push(
            PathPattern::root(),
            Arc::new(|_: &mut Request, res: &mut Response| -> MiddlewareResult {
                res.send_text("done");
                Err(anyhow::anyhow!("late failure"))
            }),
        );

        let (_, res, _) = run(&chain, "/");
        assert_eq!(res.status(), 200);
        assert!(res.body().is_some());
    }

    #[test]
    fn test_panic_is_treated_as_error() {
        let mut chain = MiddlewareChain::new();
        chain.push(
            PathPattern::root(),
            Arc::new(|_: &mut Request, _: &mut Response| -> MiddlewareResult {
                panic!("middleware bug")
            }),
        );

        let (_, res, outcome) = run(&chain, "/");
        assert_eq!(outcome, ChainOutcome::Sent);
        assert_eq!(res.status(), 500);
    }

    #[test]
    fn test_mount_params_are_merged() {
        let mut chain = MiddlewareChain::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        chain.push(
            PathPattern::parse("/users/:id"),
            Arc::new(move |req: &mut Request, _: &mut Response| -> MiddlewareResult {
                *sink.lock().unwrap() = req.path_param("id").map(str::to_string);
                next()
            }),
        );

        let (req, _, _) = run(&chain, "/users/42/posts");
        assert_eq!(seen.lock().unwrap().as_deref(), Some("42"));
        assert_eq!(req.path_param("id"), Some("42"));
        assert_eq!(req.relative_path(), "/posts");
    }

    #[test]
    fn test_longer_mount_than_path_is_skipped() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        chain.push(PathPattern::parse("/a/b/c"), recorder(&log, "deep"));

        let (_, _, outcome) = run(&chain, "/a/b");
        assert_eq!(outcome, ChainOutcome::Exhausted);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_debug_lists_mounts() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        chain.push(PathPattern::parse("/api"), recorder(&log, "api"));
        assert_eq!(format!("{chain:?}"), r#"["/api api"]"#);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.patterns().count(), 1);
    }
}
