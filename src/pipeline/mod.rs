//! Per-file transform pipeline.
//!
//! ```text
//! bytes ──► minify ──► headers ──► gzip ──► Transformed
//!           (js/css)   (type,      (compressible
//!                       cache)      types only)
//! ```
//!
//! Everything here is pure: no filesystem or network access. Transform
//! failures are recovered per file and surface only as tags.

pub mod compress;
pub mod headers;
pub mod minify;

use std::fmt;

use thiserror::Error;

use crate::utils::mime::{self, MinifyKind};

pub use headers::StorageHeaders;
pub use minify::{Minifier, NativeMinifier, Passthrough};

/// What the pipeline did to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tag {
    Minified,
    AlreadyMinified,
    MinifySkipped,
    Gzipped,
}

impl Tag {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minified => "minified",
            Self::AlreadyMinified => "already minified",
            Self::MinifySkipped => "minify skipped",
            Self::Gzipped => "gzipped",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recoverable per-file transform failure.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("{kind:?} parse error: {message}")]
    Parse { kind: MinifyKind, message: String },

    #[error("source is not valid UTF-8")]
    NotUtf8,

    #[error("no minifier available")]
    Unavailable,

    #[error("gzip failed")]
    Compress(#[source] std::io::Error),
}

/// Output of the pipeline for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub content: Vec<u8>,
    pub content_type: &'static str,
    pub headers: StorageHeaders,
    pub tags: Vec<Tag>,
}

/// Configured transform chain.
pub struct Pipeline {
    minifier: Box<dyn Minifier>,
    minify: bool,
    gzip: bool,
}

impl Pipeline {
    /// Pipeline with the native minifier, or [`Passthrough`] when
    /// minification is off.
    pub fn new(minify: bool, gzip: bool) -> Self {
        let minifier: Box<dyn Minifier> = if minify {
            Box::new(NativeMinifier)
        } else {
            Box::new(Passthrough)
        };
        Self::with_minifier(minifier, minify, gzip)
    }

    /// Pipeline with an injected minifier.
    pub fn with_minifier(minifier: Box<dyn Minifier>, minify: bool, gzip: bool) -> Self {
        Self {
            minifier,
            minify,
            gzip,
        }
    }

    /// Would this file be gzipped?
    pub fn would_gzip(&self, content_type: &str) -> bool {
        self.gzip && mime::is_compressible(content_type)
    }

    /// Would this file be handed to the minifier?
    pub fn would_minify(&self, name: &str, content_type: &str) -> bool {
        self.minify
            && !minify::is_pre_minified(name)
            && mime::minify_kind(content_type).is_some()
    }

    /// Run the chain on one file.
    ///
    /// `name` is the manifest path; the content type is guessed from it.
    pub fn process(&self, name: &str, content: Vec<u8>) -> Transformed {
        let content_type = mime::from_path(std::path::Path::new(name));
        let mut tags = Vec::new();

        let content = if self.minify {
            let (content, tag) = minify::minify(self.minifier.as_ref(), name, content_type, content);
            tags.extend(tag);
            content
        } else {
            content
        };

        let headers = StorageHeaders::for_asset(content_type);

        let (headers, content) = if self.would_gzip(content_type) {
            match compress::gzip(headers.clone(), &content) {
                Ok((headers, compressed)) => {
                    tags.push(Tag::Gzipped);
                    (headers, compressed)
                }
                Err(e) => {
                    crate::debug!("gzip"; "{}: {}, uploading uncompressed", name, e);
                    (headers, content)
                }
            }
        } else {
            (headers, content)
        };

        Transformed {
            content,
            content_type,
            headers,
            tags,
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("minifier", &self.minifier.name())
            .field("minify", &self.minify)
            .field("gzip", &self.gzip)
            .finish()
    }
}

/// Render tags the way progress lines show them: `[minified, gzipped]`.
pub fn format_tags(tags: &[Tag]) -> String {
    if tags.is_empty() {
        return String::new();
    }
    let parts: Vec<_> = tags.iter().map(|t| t.as_str()).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::headers::{CACHE_ONE_YEAR, names};
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn gunzip(bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        GzDecoder::new(bytes).read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_process_css_minify_and_gzip() {
        let pipeline = Pipeline::new(true, true);
        let out = pipeline.process("css/site.css", b"body {\n  color: red;\n}\n".to_vec());

        assert_eq!(out.tags, vec![Tag::Minified, Tag::Gzipped]);
        assert_eq!(out.headers.get(names::CONTENT_ENCODING), Some("gzip"));
        assert_eq!(out.headers.content_type(), Some("text/css"));
        assert_eq!(out.headers.get(names::CACHE_CONTROL), Some(CACHE_ONE_YEAR));
        assert_eq!(gunzip(&out.content), b"body{color:red}");
    }

    #[test]
    fn test_process_gzip_without_minify() {
        let pipeline = Pipeline::new(false, true);
        let source = b"body {\n  color: red;\n}\n".to_vec();
        let out = pipeline.process("site.css", source.clone());

        assert_eq!(out.tags, vec![Tag::Gzipped]);
        assert_eq!(gunzip(&out.content), source);
    }

    #[test]
    fn test_process_gzip_disabled() {
        let pipeline = Pipeline::new(false, false);
        let source = b"hello".to_vec();
        let out = pipeline.process("notes.txt", source.clone());

        assert!(out.tags.is_empty());
        assert_eq!(out.content, source);
        assert!(!out.headers.contains(names::CONTENT_ENCODING));
    }

    #[test]
    fn test_process_binary_untouched() {
        let pipeline = Pipeline::new(true, true);
        let source = vec![0x89, b'P', b'N', b'G'];
        let out = pipeline.process("img/logo.png", source.clone());

        assert!(out.tags.is_empty());
        assert_eq!(out.content, source);
        assert_eq!(out.content_type, "image/png");
    }

    #[test]
    fn test_process_unknown_type() {
        let pipeline = Pipeline::new(true, true);
        let out = pipeline.process("blob.bin", vec![1, 2, 3]);
        assert_eq!(out.headers.content_type(), Some("application/octet-stream"));
        assert!(out.tags.is_empty());
    }

    #[test]
    fn test_process_pre_minified_still_gzipped() {
        let pipeline = Pipeline::new(true, true);
        let source = b"var a=1;".to_vec();
        let out = pipeline.process("vendor/jquery.min.js", source.clone());

        assert_eq!(out.tags, vec![Tag::AlreadyMinified, Tag::Gzipped]);
        assert_eq!(gunzip(&out.content), source);
    }

    #[test]
    fn test_process_with_passthrough_minifier() {
        let pipeline = Pipeline::with_minifier(Box::new(Passthrough), true, false);
        let source = b"a {  color: blue; }".to_vec();
        let out = pipeline.process("a.css", source.clone());

        assert_eq!(out.tags, vec![Tag::MinifySkipped]);
        assert_eq!(out.content, source);
    }

    #[test]
    fn test_minify_off_uses_passthrough() {
        let pipeline = Pipeline::new(false, false);
        assert!(format!("{pipeline:?}").contains("passthrough"));
        let out = pipeline.process("app.js", b"var  a = 1;".to_vec());
        assert!(out.tags.is_empty());
        assert_eq!(out.content, b"var  a = 1;");
    }

    #[test]
    fn test_would_predicates() {
        let pipeline = Pipeline::new(true, false);
        assert!(pipeline.would_minify("app.js", "application/javascript"));
        assert!(!pipeline.would_minify("app.min.js", "application/javascript"));
        assert!(!pipeline.would_minify("logo.png", "image/png"));
        assert!(!pipeline.would_gzip("text/css"));

        let pipeline = Pipeline::new(false, true);
        assert!(!pipeline.would_minify("app.js", "application/javascript"));
        assert!(pipeline.would_gzip("text/css"));
        assert!(!pipeline.would_gzip("text/html"));
    }

    #[test]
    fn test_format_tags() {
        assert_eq!(format_tags(&[]), "");
        assert_eq!(format_tags(&[Tag::Minified, Tag::Gzipped]), "[minified, gzipped]");
        assert_eq!(Tag::AlreadyMinified.to_string(), "already minified");
    }
}
