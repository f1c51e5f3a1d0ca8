//! Message bodies.
//!
//! A [`Body`] is one of a small fixed set of variants. Incoming requests
//! always start as [`Body::Raw`]; body-parsing middleware replaces that with
//! a richer variant after inspecting the `content-type` header.
//!
//! Every variant supports the same capability: build it from bytes
//! (`parse_from`), turn it back into bytes ([`Body::serialize`]) and report
//! its content type ([`Body::content_type`]).

use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use trellis_router::Params;

/// Content type reported by [`Body::Raw`].
pub const RAW_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type of [`FormBody`].
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Content type of [`JsonBody`].
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Default content type of [`TextBody`].
pub const TEXT_CONTENT_TYPE: &str = "text/plain";

/// The variant tag of a [`Body`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKind {
    /// Unparsed bytes.
    Raw,
    /// UTF-8 text.
    Text,
    /// URL-encoded form fields.
    Form,
    /// A JSON document.
    Json,
    /// Opaque bytes with a declared content type.
    Binary,
}

impl fmt::Display for BodyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Raw => "raw",
            Self::Text => "text",
            Self::Form => "form",
            Self::Json => "json",
            Self::Binary => "binary",
        };
        f.write_str(name)
    }
}

/// A typed accessor was used on a body of a different kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("expected a {expected} body, found a {actual} body")]
pub struct BodyTypeMismatch {
    /// The kind the caller asked for.
    pub expected: BodyKind,
    /// The kind the body actually is.
    pub actual: BodyKind,
}

/// Bytes could not be parsed into the requested body kind.
#[derive(Debug, Error)]
pub enum BodyParseError {
    /// Malformed `application/x-www-form-urlencoded` payload.
    #[error("invalid form body: {0}")]
    Form(#[from] serde_urlencoded::de::Error),

    /// Malformed JSON payload.
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

/// A UTF-8 text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBody {
    /// The text content.
    pub text: String,
    content_type: String,
}

impl TextBody {
    /// Creates a `text/plain` body.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_content_type(text, TEXT_CONTENT_TYPE)
    }

    /// Creates a text body with a specific content type, e.g. `text/html`.
    pub fn with_content_type(text: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            content_type: content_type.into(),
        }
    }

    /// Decodes bytes as text, replacing invalid UTF-8 sequences.
    pub fn parse_from(bytes: &[u8], content_type: impl Into<String>) -> Self {
        Self::with_content_type(String::from_utf8_lossy(bytes), content_type)
    }

    /// The declared content type.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Serializes back to bytes.
    pub fn serialize(&self) -> Bytes {
        Bytes::copy_from_slice(self.text.as_bytes())
    }
}

/// URL-encoded form fields. Repeated field names keep the last value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormBody {
    /// The decoded fields.
    pub fields: Params,
}

impl FormBody {
    /// Creates a form body from fields.
    pub fn new(fields: Params) -> Self {
        Self { fields }
    }

    /// Parses an `application/x-www-form-urlencoded` payload.
    pub fn parse_from(bytes: &[u8]) -> Result<Self, BodyParseError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(bytes)?;
        Ok(Self {
            fields: pairs.into_iter().collect(),
        })
    }

    /// Returns a field value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name)
    }

    /// Serializes the fields as `key=value&...`.
    pub fn serialize(&self) -> Bytes {
        let encoded: Vec<String> = self
            .fields
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        Bytes::from(encoded.join("&"))
    }
}

/// A JSON document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsonBody {
    /// The parsed value.
    pub value: serde_json::Value,
}

impl JsonBody {
    /// Wraps a value.
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Serializes any `Serialize` type into a JSON body.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            value: serde_json::to_value(value)?,
        })
    }

    /// Parses a JSON payload.
    pub fn parse_from(bytes: &[u8]) -> Result<Self, BodyParseError> {
        Ok(Self {
            value: serde_json::from_slice(bytes)?,
        })
    }

    /// Serializes to compact JSON.
    pub fn serialize(&self) -> Bytes {
        Bytes::from(self.value.to_string())
    }
}

/// Opaque bytes with whatever content type the sender declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryBody {
    /// The payload.
    pub data: Bytes,
    content_type: String,
}

impl BinaryBody {
    /// Creates a binary body.
    pub fn new(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    /// Keeps the bytes as they are.
    pub fn parse_from(bytes: Bytes, content_type: impl Into<String>) -> Self {
        Self::new(bytes, content_type)
    }

    /// The declared content type.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Returns the payload.
    pub fn serialize(&self) -> Bytes {
        self.data.clone()
    }
}

/// A request or response body.
///
/// # Example
///
/// ```rust
/// use trellis_core::{Body, BodyKind};
///
/// let body = Body::json_value(serde_json::json!({"ok": true}));
/// assert_eq!(body.content_type(), "application/json");
/// assert_eq!(&body.serialize()[..], br#"{"ok":true}"#);
///
/// let err = body.as_text().unwrap_err();
/// assert_eq!(err.actual, BodyKind::Json);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Unparsed bytes as received from the transport.
    Raw(Bytes),
    /// Text.
    Text(TextBody),
    /// URL-encoded form fields.
    Form(FormBody),
    /// JSON.
    Json(JsonBody),
    /// Bytes with a declared content type.
    Binary(BinaryBody),
}

macro_rules! accessors {
    ($($variant:ident => $ty:ty, $as_ref:ident, $as_mut:ident;)*) => {
        $(
            #[doc = concat!("Borrows the body as [`", stringify!($ty), "`].")]
            pub fn $as_ref(&self) -> Result<&$ty, BodyTypeMismatch> {
                match self {
                    Self::$variant(inner) => Ok(inner),
                    other => Err(other.mismatch(BodyKind::$variant)),
                }
            }

            #[doc = concat!("Mutably borrows the body as [`", stringify!($ty), "`].")]
            pub fn $as_mut(&mut self) -> Result<&mut $ty, BodyTypeMismatch> {
                match self {
                    Self::$variant(inner) => Ok(inner),
                    other => Err(other.mismatch(BodyKind::$variant)),
                }
            }
        )*
    };
}

impl Body {
    /// Wraps raw bytes.
    pub fn raw(bytes: impl Into<Bytes>) -> Self {
        Self::Raw(bytes.into())
    }

    /// A `text/plain` body.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextBody::new(text))
    }

    /// A JSON body from a value.
    pub fn json_value(value: serde_json::Value) -> Self {
        Self::Json(JsonBody::new(value))
    }

    /// A JSON body from any serializable type.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        JsonBody::from_serialize(value).map(Self::Json)
    }

    /// The variant tag.
    pub fn kind(&self) -> BodyKind {
        match self {
            Self::Raw(_) => BodyKind::Raw,
            Self::Text(_) => BodyKind::Text,
            Self::Form(_) => BodyKind::Form,
            Self::Json(_) => BodyKind::Json,
            Self::Binary(_) => BodyKind::Binary,
        }
    }

    /// The content type this body declares.
    pub fn content_type(&self) -> &str {
        match self {
            Self::Raw(_) => RAW_CONTENT_TYPE,
            Self::Text(text) => text.content_type(),
            Self::Form(_) => FORM_CONTENT_TYPE,
            Self::Json(_) => JSON_CONTENT_TYPE,
            Self::Binary(binary) => binary.content_type(),
        }
    }

    /// Serializes the body to wire bytes.
    pub fn serialize(&self) -> Bytes {
        match self {
            Self::Raw(bytes) => bytes.clone(),
            Self::Text(text) => text.serialize(),
            Self::Form(form) => form.serialize(),
            Self::Json(json) => json.serialize(),
            Self::Binary(binary) => binary.serialize(),
        }
    }

    accessors! {
        Raw => Bytes, as_raw, as_raw_mut;
        Text => TextBody, as_text, as_text_mut;
        Form => FormBody, as_form, as_form_mut;
        Json => JsonBody, as_json, as_json_mut;
        Binary => BinaryBody, as_binary, as_binary_mut;
    }

    fn mismatch(&self, expected: BodyKind) -> BodyTypeMismatch {
        BodyTypeMismatch {
            expected,
            actual: self.kind(),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::Raw(bytes)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Self::json_value(value)
    }
}

impl From<TextBody> for Body {
    fn from(body: TextBody) -> Self {
        Self::Text(body)
    }
}

impl From<FormBody> for Body {
    fn from(body: FormBody) -> Self {
        Self::Form(body)
    }
}

impl From<JsonBody> for Body {
    fn from(body: JsonBody) -> Self {
        Self::Json(body)
    }
}

impl From<BinaryBody> for Body {
    fn from(body: BinaryBody) -> Self {
        Self::Binary(body)
    }
}
