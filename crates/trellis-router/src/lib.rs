//! URI parsing and path routing for Trellis.
//!
//! This crate holds the pure, allocation-light pieces of request routing:
//!
//! - **URI parsing**: [`parse_uri`] turns a raw request target into
//!   normalized, decoded path segments and query parameters.
//! - **Path patterns**: [`PathPattern`] supports literal, `*` and `:name`
//!   segments with full and prefix matching.
//! - **Route tables**: [`RouteTable`] keeps per-method routes in
//!   registration order; the first full match wins.
//!
//! # Example
//!
//! ```rust
//! use trellis_router::{parse_uri, HttpMethod, PathPattern, RouteTable};
//!
//! let mut table = RouteTable::new();
//! table.insert(HttpMethod::Get, PathPattern::parse("/items/:id"), "getItem");
//!
//! let uri = parse_uri("/items/7?x=1").unwrap();
//! let found = table.find(HttpMethod::Get, &uri.segments).unwrap();
//!
//! assert_eq!(found.params.get("id"), Some("7"));
//! assert_eq!(uri.query.get("x"), Some("1"));
//! ```
//!
//! # Matching model
//!
//! ```text
//!   path:     /api/v1/users/42
//!   pattern:  /api/:version            (prefix match)
//!             └──────┬─────┘
//!                 base     relative = [users, 42]
//! ```
//!
//! Segments never span `/`; there is no multi-segment wildcard.

mod method;
mod params;
mod pattern;
mod table;
mod uri;

pub use method::{HttpMethod, UnsupportedMethod};
pub use params::Params;
pub use pattern::{PathPattern, Segment};
pub use table::{Route, RouteMatch, RouteTable};
pub use uri::{
    build_path, decode_component, parse_path, parse_uri, DecodeError, InvalidUriError, ParsedUri,
};
