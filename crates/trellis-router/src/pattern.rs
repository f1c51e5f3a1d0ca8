//! Segment patterns and the full/prefix matcher.

use crate::params::Params;
use crate::uri::{build_path, parse_path};
use smallvec::SmallVec;
use std::fmt;

/// Patterns rarely exceed this many segments; longer ones spill to the heap.
const INLINE_SEGMENTS: usize = 4;

/// One segment of a registered pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the path segment verbatim.
    Literal(String),
    /// `*`: matches any single non-empty segment.
    Wildcard,
    /// `:name`: matches any single non-empty segment and binds it to `name`.
    Param(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if raw == "*" {
            Self::Wildcard
        } else if let Some(name) = raw.strip_prefix(':').filter(|n| !n.is_empty()) {
            Self::Param(name.to_string())
        } else {
            Self::Literal(raw.to_string())
        }
    }

    fn matches(&self, segment: &str) -> bool {
        if segment.is_empty() {
            return false;
        }
        match self {
            Self::Literal(literal) => literal == segment,
            Self::Wildcard | Self::Param(_) => true,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(literal) => f.write_str(literal),
            Self::Wildcard => f.write_str("*"),
            Self::Param(name) => write!(f, ":{name}"),
        }
    }
}

/// A path pattern parsed once at registration time.
///
/// An empty pattern is the root mount: it prefix-matches every path and
/// fully matches only the root path.
///
/// # Example
///
/// ```rust
/// use trellis_router::PathPattern;
///
/// let pattern = PathPattern::parse("/users/:id");
/// let path = ["users", "42", "posts"];
///
/// assert!(!pattern.matches_full(&path));
/// assert!(pattern.matches_prefix(&path));
/// assert_eq!(pattern.extract_params(&path).get("id"), Some("42"));
/// assert_eq!(pattern.relative_path(&path), &["posts"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathPattern {
    segments: SmallVec<[Segment; INLINE_SEGMENTS]>,
}

impl PathPattern {
    /// Parses a pattern string such as `/items/:id/*`.
    #[must_use]
    pub fn parse(pattern: &str) -> Self {
        Self {
            segments: parse_path(pattern)
                .iter()
                .map(|s| Segment::parse(s))
                .collect(),
        }
    }

    /// The root pattern, matching everything as a prefix.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns true for the root (empty) pattern.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments in the pattern.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if the pattern has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of all parameters declared by this pattern, in order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Segment-for-segment match of the whole path.
    #[must_use]
    pub fn matches_full<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.segments.len() == path.len() && self.matches_leading(path)
    }

    /// Matches when the pattern is a segment-wise prefix of `path`.
    #[must_use]
    pub fn matches_prefix<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.segments.len() <= path.len() && self.matches_leading(path)
    }

    /// Collects `name -> segment` for every `:name` position.
    ///
    /// Only meaningful after a successful full or prefix match. A pattern
    /// that declares the same name twice binds the later position.
    #[must_use]
    pub fn extract_params<S: AsRef<str>>(&self, path: &[S]) -> Params {
        let mut params = Params::new();
        for (pattern, segment) in self.segments.iter().zip(path) {
            if let Segment::Param(name) = pattern {
                params.insert(name.as_str(), segment.as_ref());
            }
        }
        params
    }

    /// The unmatched remainder of `path` after this pattern's prefix.
    #[must_use]
    pub fn relative_path<'p, S>(&self, path: &'p [S]) -> &'p [S] {
        path.get(self.segments.len()..).unwrap_or(&[])
    }

    fn matches_leading<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.segments
            .iter()
            .zip(path)
            .all(|(pattern, segment)| pattern.matches(segment.as_ref()))
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.segments.iter().map(ToString::to_string).collect();
        f.write_str(&build_path(&rendered))
    }
}

impl From<&str> for PathPattern {
    fn from(pattern: &str) -> Self {
        Self::parse(pattern)
    }
}
