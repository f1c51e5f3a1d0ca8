//! Request-target parsing and normalization.
//!
//! A raw request target such as `/a/../b%20c/?x=1#frag` is turned into
//! normalized, decoded path segments (`["b c"]`) and a decoded query map
//! (`{x: "1"}`). Route patterns go through [`parse_path`] instead, which
//! normalizes but never decodes.

use crate::params::Params;
use std::borrow::Cow;
use thiserror::Error;

/// Percent-decoding failure for a single URI component.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// `%` at `position` is not followed by two characters.
    #[error("truncated percent escape at byte {position}")]
    Truncated {
        /// Byte offset of the `%`.
        position: usize,
    },

    /// `%` at `position` is followed by something other than two hex digits.
    #[error("invalid hex digits in percent escape at byte {position}")]
    InvalidHex {
        /// Byte offset of the `%`.
        position: usize,
    },

    /// The decoded bytes are not UTF-8.
    #[error("decoded component is not valid UTF-8")]
    InvalidUtf8,
}

/// The request target could not be parsed.
///
/// Raised before any request context exists; the transport layer is
/// expected to answer with 400.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidUriError {
    /// A path segment or query component has broken percent-encoding.
    #[error("invalid URL encoding in URI {uri:?}: {source}")]
    Encoding {
        /// The raw request target.
        uri: String,
        /// The underlying decoding failure.
        #[source]
        source: DecodeError,
    },

    /// A decoded path segment contains a control character or backslash.
    #[error("invalid path in URI {uri:?}")]
    InvalidPath {
        /// The raw request target.
        uri: String,
    },

    /// A decoded query key or value contains a control character.
    #[error("invalid query in URI {uri:?}")]
    InvalidQuery {
        /// The raw request target.
        uri: String,
    },
}

/// A parsed request target: normalized path segments and decoded query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedUri {
    /// Decoded path segments, never empty strings.
    pub segments: Vec<String>,
    /// Decoded query parameters; duplicate keys keep the last value.
    pub query: Params,
}

impl ParsedUri {
    /// Returns the normalized path as a string (`/` for the root).
    #[must_use]
    pub fn path(&self) -> String {
        build_path(&self.segments)
    }
}

/// Parses a raw, still percent-encoded request target.
///
/// The fragment is discarded, the path is split on `/` with empty segments
/// dropped, `.` and `..` are resolved on the encoded segments, and then
/// every path segment and every query key and value is decoded on its own.
///
/// # Example
///
/// ```rust
/// use trellis_router::parse_uri;
///
/// let parsed = parse_uri("/a/../b/./c?x=1&flag").unwrap();
/// assert_eq!(parsed.segments, vec!["b", "c"]);
/// assert_eq!(parsed.query.get("x"), Some("1"));
/// assert_eq!(parsed.query.get("flag"), Some(""));
/// ```
pub fn parse_uri(raw: &str) -> Result<ParsedUri, InvalidUriError> {
    let without_fragment = raw.split_once('#').map_or(raw, |(head, _)| head);
    let (path, query) = without_fragment
        .split_once('?')
        .unwrap_or((without_fragment, ""));

    let encoding = |source| InvalidUriError::Encoding {
        uri: raw.to_string(),
        source,
    };

    let mut segments = Vec::new();
    for segment in normalize(split_segments(path)) {
        let decoded = decode_component(segment).map_err(encoding)?;
        if !is_valid_path_segment(&decoded) {
            return Err(InvalidUriError::InvalidPath {
                uri: raw.to_string(),
            });
        }
        segments.push(decoded);
    }

    let mut params = Params::new();
    for (key, value) in split_query(query) {
        let key = decode_component(key).map_err(encoding)?;
        let value = decode_component(value).map_err(encoding)?;
        if !is_valid_query_component(&key) || !is_valid_query_component(&value) {
            return Err(InvalidUriError::InvalidQuery {
                uri: raw.to_string(),
            });
        }
        params.insert(key, value);
    }

    Ok(ParsedUri {
        segments,
        query: params,
    })
}

/// Splits a registration-time pattern into normalized segments.
///
/// No percent-decoding and no query splitting is performed.
///
/// ```rust
/// use trellis_router::parse_path;
///
/// assert_eq!(parse_path("/users/:id/"), vec!["users", ":id"]);
/// assert!(parse_path("/").is_empty());
/// ```
#[must_use]
pub fn parse_path(pattern: &str) -> Vec<String> {
    normalize(split_segments(pattern))
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Joins segments back into an absolute path.
#[must_use]
pub fn build_path<S: AsRef<str>>(segments: &[S]) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }
    let mut path = String::new();
    for segment in segments {
        path.push('/');
        path.push_str(segment.as_ref());
    }
    path
}

/// Percent- and `+`-decodes one URI component.
///
/// Every `%` must introduce exactly two hex digits.
pub fn decode_component(encoded: &str) -> Result<String, DecodeError> {
    let bytes = encoded.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if i + 2 >= bytes.len() {
                return Err(DecodeError::Truncated { position: i });
            }
            if !bytes[i + 1].is_ascii_hexdigit() || !bytes[i + 2].is_ascii_hexdigit() {
                return Err(DecodeError::InvalidHex { position: i });
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    let spaced: Cow<'_, str> = if encoded.contains('+') {
        Cow::Owned(encoded.replace('+', " "))
    } else {
        Cow::Borrowed(encoded)
    };
    let decoded = urlencoding::decode_binary(spaced.as_bytes());
    String::from_utf8(decoded.into_owned()).map_err(|_| DecodeError::InvalidUtf8)
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn normalize<'a>(segments: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut stack = Vec::new();
    for segment in segments {
        match segment {
            "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }
    stack
}

fn split_query(query: &str) -> impl Iterator<Item = (&str, &str)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
}

fn is_valid_path_segment(segment: &str) -> bool {
    !segment.chars().any(|c| c.is_control() || c == '\\')
}

fn is_valid_query_component(component: &str) -> bool {
    !component.chars().any(char::is_control)
}
