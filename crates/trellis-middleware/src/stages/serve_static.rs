//! Static file serving middleware.
//!
//! Maps the request's path below the mount point onto a directory and sends
//! the file found there. A directory answers with its index file. Anything
//! that does not resolve to a readable file inside the root (a missing file,
//! a hidden name, a symlink pointing outside, a method other than `GET` or
//! `HEAD`) passes through to the rest of the chain, so routes mounted after
//! the stage still see it.
//!
//! ## Example
//!
//! ```rust,no_run
//! use trellis_middleware::stages::ServeStatic;
//!
//! let assets = ServeStatic::new("./public")
//!     .index("index.html")
//!     .cache_control("max-age=3600")
//!     .mime_type("glb", "model/gltf-binary");
//! ```

use crate::middleware::{next, Middleware, MiddlewareResult};
use anyhow::Context;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use trellis_core::{BinaryBody, HttpMethod, Request, Response};

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Extension (lowercase, no dot) to content type.
const MIME_TYPES: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("xml", "application/xml"),
    ("js", "application/javascript"),
    ("mjs", "application/javascript"),
    ("json", "application/json"),
    ("map", "application/json"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    ("tiff", "image/tiff"),
    ("tif", "image/tiff"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("aac", "audio/aac"),
    ("flac", "audio/flac"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("ogv", "video/ogg"),
    ("avi", "video/x-msvideo"),
    ("mov", "video/quicktime"),
    ("mkv", "video/x-matroska"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("otf", "font/otf"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("tar", "application/x-tar"),
    ("rar", "application/vnd.rar"),
    ("7z", "application/x-7z-compressed"),
    ("wasm", "application/wasm"),
];

/// Serves files from a directory.
#[derive(Debug, Clone)]
pub struct ServeStatic {
    root: PathBuf,
    index_file: Option<String>,
    cache_control: Option<String>,
    serve_hidden: bool,
    mime_types: HashMap<String, String>,
}

/// Where a relative path led.
#[derive(Debug)]
enum Lookup {
    File(PathBuf),
    Skip(&'static str),
}

impl ServeStatic {
    /// Serves files below `root`, with `index.html` as the directory index.
    ///
    /// The root does not have to exist yet; it is resolved on every request.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            index_file: Some("index.html".to_string()),
            cache_control: None,
            serve_hidden: false,
            mime_types: HashMap::new(),
        }
    }

    /// Sets the file served for a directory.
    #[must_use]
    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.index_file = Some(name.into());
        self
    }

    /// Directories are never served.
    #[must_use]
    pub fn without_index(mut self) -> Self {
        self.index_file = None;
        self
    }

    /// Sets a `cache-control` value for every file sent.
    #[must_use]
    pub fn cache_control(mut self, value: impl Into<String>) -> Self {
        self.cache_control = Some(value.into());
        self
    }

    /// Allows names starting with `.`. Off by default.
    #[must_use]
    pub fn serve_hidden(mut self, enabled: bool) -> Self {
        self.serve_hidden = enabled;
        self
    }

    /// Adds or overrides the content type for an extension (without the dot).
    #[must_use]
    pub fn mime_type(mut self, extension: impl AsRef<str>, mime_type: impl Into<String>) -> Self {
        self.mime_types
            .insert(extension.as_ref().to_ascii_lowercase(), mime_type.into());
        self
    }

    /// The configured root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Content type for `path`, by extension, case-insensitively.
    #[must_use]
    pub fn content_type_for(&self, path: &Path) -> &str {
        let Some(ext) = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
        else {
            return FALLBACK_MIME_TYPE;
        };
        if let Some(custom) = self.mime_types.get(&ext) {
            return custom;
        }
        MIME_TYPES
            .iter()
            .find(|(known, _)| *known == ext)
            .map_or(FALLBACK_MIME_TYPE, |(_, mime)| *mime)
    }

    fn lookup(&self, segments: &[String]) -> Lookup {
        let mut candidate = self.root.clone();
        for segment in segments {
            // Segments are already decoded, so `%2F` and `%2E%2E` show up here.
            if segment == "." || segment == ".." || segment.contains('/') {
                return Lookup::Skip("unsafe segment");
            }
            if !self.serve_hidden && segment.starts_with('.') {
                return Lookup::Skip("hidden name");
            }
            candidate.push(segment);
        }

        let Ok(root) = self.root.canonicalize() else {
            return Lookup::Skip("root missing");
        };
        let Ok(mut resolved) = candidate.canonicalize() else {
            return Lookup::Skip("not found");
        };
        if !resolved.starts_with(&root) {
            return Lookup::Skip("outside root");
        }

        if resolved.is_dir() {
            let Some(index) = &self.index_file else {
                return Lookup::Skip("directory");
            };
            let Ok(index) = resolved.join(index).canonicalize() else {
                return Lookup::Skip("no index");
            };
            if !index.starts_with(&root) || !index.is_file() {
                return Lookup::Skip("no index");
            }
            resolved = index;
        } else if !resolved.is_file() {
            return Lookup::Skip("not a file");
        }
        Lookup::File(resolved)
    }
}

impl Middleware for ServeStatic {
    fn name(&self) -> &str {
        "serve-static"
    }

    fn handle(&self, req: &mut Request, res: &mut Response) -> MiddlewareResult {
        let method = req.method();
        if method != HttpMethod::Get && method != HttpMethod::Head {
            return next();
        }

        let path = match self.lookup(req.relative_segments()) {
            Lookup::File(path) => path,
            Lookup::Skip(reason) => {
                tracing::trace!(path = %req.relative_path(), reason, "static lookup skipped");
                return next();
            }
        };

        let data = std::fs::read(&path)
            .with_context(|| format!("failed to read static file {}", path.display()))?;
        let content_type = self.content_type_for(&path).to_string();
        tracing::debug!(file = %path.display(), bytes = data.len(), "serving static file");

        if let Some(value) = &self.cache_control {
            res.set_header("cache-control", value);
        }
        if method == HttpMethod::Head {
            res.clear_body()
                .set_header("content-type", &content_type)
                .set_header("content-length", &data.len().to_string())
                .send();
        } else {
            res.set_body(BinaryBody::new(Bytes::from(data), content_type)).send();
        }
        next()
    }
}
