//! Method-keyed route tables.
//!
//! Each method owns an ordered list of `(pattern, handler)` pairs. Lookup is
//! a linear scan in registration order and the first full match wins, so
//! earlier registrations shadow later ones for the same path.

use crate::method::HttpMethod;
use crate::params::Params;
use crate::pattern::PathPattern;

/// A registered route: a full-match pattern plus its handler.
#[derive(Debug, Clone)]
pub struct Route<H> {
    pattern: PathPattern,
    handler: H,
}

impl<H> Route<H> {
    /// Creates a route.
    pub fn new(pattern: PathPattern, handler: H) -> Self {
        Self { pattern, handler }
    }

    /// The route's pattern.
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// The route's handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }
}

/// Result of a successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    /// The matched route's pattern.
    pub pattern: &'a PathPattern,
    /// The matched route's handler.
    pub handler: &'a H,
    /// Parameters bound by the pattern.
    pub params: Params,
}

/// Per-method ordered route lists.
///
/// # Example
///
/// ```rust
/// use trellis_router::{HttpMethod, PathPattern, RouteTable};
///
/// let mut table = RouteTable::new();
/// table.insert(HttpMethod::Get, PathPattern::parse("/items/:id"), "getItem");
///
/// let found = table.find(HttpMethod::Get, &["items", "7"]).unwrap();
/// assert_eq!(*found.handler, "getItem");
/// assert_eq!(found.params.get("id"), Some("7"));
///
/// assert!(table.find(HttpMethod::Post, &["items", "7"]).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct RouteTable<H> {
    routes: [Vec<Route<H>>; HttpMethod::COUNT],
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self {
            routes: std::array::from_fn(|_| Vec::new()),
        }
    }
}

impl<H> RouteTable<H> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a route for `method`.
    pub fn insert(&mut self, method: HttpMethod, pattern: PathPattern, handler: H) {
        self.routes[method.index()].push(Route::new(pattern, handler));
    }

    /// Routes registered for `method`, in registration order.
    pub fn routes(&self, method: HttpMethod) -> &[Route<H>] {
        &self.routes[method.index()]
    }

    /// Finds the first route for `method` whose pattern fully matches `path`.
    pub fn find<S: AsRef<str>>(&self, method: HttpMethod, path: &[S]) -> Option<RouteMatch<'_, H>> {
        self.routes(method)
            .iter()
            .find(|route| route.pattern.matches_full(path))
            .map(|route| RouteMatch {
                pattern: &route.pattern,
                handler: &route.handler,
                params: route.pattern.extract_params(path),
            })
    }

    /// Methods that have a route fully matching `path`.
    pub fn allowed_methods<S: AsRef<str>>(&self, path: &[S]) -> Vec<HttpMethod> {
        HttpMethod::ALL
            .into_iter()
            .filter(|m| self.routes(*m).iter().any(|r| r.pattern.matches_full(path)))
            .collect()
    }

    /// Total number of routes across all methods.
    pub fn len(&self) -> usize {
        self.routes.iter().map(Vec::len).sum()
    }

    /// Returns true if no routes are registered.
    pub fn is_empty(&self) -> bool {
        self.routes.iter().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable<&'static str> {
        let mut table = RouteTable::new();
        table.insert(HttpMethod::Get, PathPattern::parse("/users"), "listUsers");
        table.insert(HttpMethod::Get, PathPattern::parse("/users/me"), "getMe");
        table.insert(HttpMethod::Get, PathPattern::parse("/users/:id"), "getUser");
        table.insert(HttpMethod::Delete, PathPattern::parse("/users/:id"), "deleteUser");
        table
    }

    #[test]
    fn test_find_by_method() {
        let table = table();
        assert_eq!(*table.find(HttpMethod::Get, &["users"]).unwrap().handler, "listUsers");
        assert_eq!(
            *table.find(HttpMethod::Delete, &["users", "1"]).unwrap().handler,
            "deleteUser"
        );
        assert!(table.find(HttpMethod::Post, &["users"]).is_none());
    }

    #[test]
    fn test_first_registered_wins() {
        let table = table();
        let found = table.find(HttpMethod::Get, &["users", "me"]).unwrap();
        assert_eq!(*found.handler, "getMe");
        assert!(found.params.is_empty());
    }

    #[test]
    fn test_later_registration_is_shadowed() {
        let mut table = RouteTable::new();
        table.insert(HttpMethod::Get, PathPattern::parse("/:any"), 1);
        table.insert(HttpMethod::Get, PathPattern::parse("/exact"), 2);
        assert_eq!(*table.find(HttpMethod::Get, &["exact"]).unwrap().handler, 1);
    }

    #[test]
    fn test_find_requires_full_match() {
        let table = table();
        assert!(table.find(HttpMethod::Get, &["users", "1", "posts"]).is_none());
    }

    #[test]
    fn test_find_extracts_params() {
        let table = table();
        let found = table.find(HttpMethod::Get, &["users", "42"]).unwrap();
        assert_eq!(found.params.get("id"), Some("42"));
        assert_eq!(found.pattern.to_string(), "/users/:id");
    }

    #[test]
    fn test_root_route() {
        let mut table = RouteTable::new();
        table.insert(HttpMethod::Get, PathPattern::root(), "home");
        assert!(table.find::<&str>(HttpMethod::Get, &[]).is_some());
        assert!(table.find(HttpMethod::Get, &["x"]).is_none());
    }

    #[test]
    fn test_allowed_methods() {
        let table = table();
        assert_eq!(
            table.allowed_methods(&["users", "9"]),
            vec![HttpMethod::Get, HttpMethod::Delete]
        );
        assert!(table.allowed_methods(&["nope"]).is_empty());
    }

    #[test]
    fn test_len() {
        let table = table();
        assert_eq!(table.len(), 4);
        assert!(!table.is_empty());
        assert!(RouteTable::<()>::new().is_empty());
    }
}
