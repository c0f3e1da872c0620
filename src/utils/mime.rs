//! MIME type detection for published assets.
//!
//! Content types are guessed from the file extension. Checks that decide
//! whether a file gets minified or gzipped compare the MIME *essence*
//! (`type/subtype`), so parameters like `charset` never change the outcome.

use std::path::Path;

/// Common MIME type constants.
pub mod types {
    // Text
    pub const HTML: &str = "text/html";
    pub const PLAIN: &str = "text/plain";
    pub const CSS: &str = "text/css";
    pub const JAVASCRIPT: &str = "application/javascript";
    pub const JAVASCRIPT_TEXT: &str = "text/javascript";
    pub const JSON: &str = "application/json";
    pub const XML: &str = "application/xml";
    pub const CSV: &str = "text/csv";
    pub const MARKDOWN: &str = "text/markdown";
    pub const MANIFEST: &str = "application/manifest+json";
    pub const SOURCE_MAP: &str = "application/json";

    // Web feeds
    pub const RSS: &str = "application/rss+xml";
    pub const ATOM: &str = "application/atom+xml";

    // Documents
    pub const PDF: &str = "application/pdf";

    // Binary
    pub const OCTET_STREAM: &str = "application/octet-stream";
    pub const WASM: &str = "application/wasm";
    pub const ZIP: &str = "application/zip";
    pub const GZIP: &str = "application/gzip";

    // Images
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const GIF: &str = "image/gif";
    pub const WEBP: &str = "image/webp";
    pub const AVIF: &str = "image/avif";
    pub const SVG: &str = "image/svg+xml";
    pub const ICO: &str = "image/x-icon";

    // Audio / Video
    pub const MP3: &str = "audio/mpeg";
    pub const OGG_AUDIO: &str = "audio/ogg";
    pub const MP4: &str = "video/mp4";
    pub const WEBM: &str = "video/webm";

    // Fonts
    pub const WOFF: &str = "font/woff";
    pub const WOFF2: &str = "font/woff2";
    pub const TTF: &str = "font/ttf";
    pub const OTF: &str = "font/otf";
    pub const EOT: &str = "application/vnd.ms-fontobject";
}

/// Content types that are gzipped when compression is enabled.
pub const COMPRESSIBLE: &[&str] = &[
    types::PLAIN,
    types::CSV,
    types::XML,
    types::JAVASCRIPT,
    types::JAVASCRIPT_TEXT,
    types::CSS,
];

/// Source language a minifier understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinifyKind {
    Script,
    Stylesheet,
}

/// Guess MIME type from a path's extension.
///
/// Unknown or missing extensions yield `application/octet-stream`.
pub fn from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    from_extension(ext.as_deref())
}

/// Guess MIME type from an extension string (without the dot).
pub fn from_extension(ext: Option<&str>) -> &'static str {
    match ext {
        Some("html" | "htm") => types::HTML,
        Some("css") => types::CSS,
        Some("js" | "mjs" | "cjs") => types::JAVASCRIPT,
        Some("json") => types::JSON,
        Some("map") => types::SOURCE_MAP,
        Some("webmanifest") => types::MANIFEST,
        Some("xml") => types::XML,
        Some("csv") => types::CSV,
        Some("txt") => types::PLAIN,
        Some("md") => types::MARKDOWN,

        Some("rss") => types::RSS,
        Some("atom") => types::ATOM,

        Some("svg") => types::SVG,
        Some("png") => types::PNG,
        Some("jpg" | "jpeg") => types::JPEG,
        Some("gif") => types::GIF,
        Some("webp") => types::WEBP,
        Some("avif") => types::AVIF,
        Some("ico") => types::ICO,

        Some("mp3") => types::MP3,
        Some("ogg" | "oga") => types::OGG_AUDIO,
        Some("mp4" | "m4v") => types::MP4,
        Some("webm") => types::WEBM,

        Some("woff") => types::WOFF,
        Some("woff2") => types::WOFF2,
        Some("ttf") => types::TTF,
        Some("otf") => types::OTF,
        Some("eot") => types::EOT,

        Some("pdf") => types::PDF,
        Some("wasm") => types::WASM,
        Some("zip") => types::ZIP,
        Some("gz" | "gzip") => types::GZIP,

        _ => types::OCTET_STREAM,
    }
}

/// Strip parameters and normalize case: `Text/CSS; charset=utf-8` -> `text/css`.
pub fn essence(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Check if the MIME type is in the gzip set.
pub fn is_compressible(mime: &str) -> bool {
    let essence = essence(mime);
    COMPRESSIBLE.contains(&essence.as_str())
}

/// Which minifier (if any) handles this MIME type.
pub fn minify_kind(mime: &str) -> Option<MinifyKind> {
    match essence(mime).as_str() {
        types::JAVASCRIPT | types::JAVASCRIPT_TEXT => Some(MinifyKind::Script),
        types::CSS => Some(MinifyKind::Stylesheet),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_path() {
        assert_eq!(from_path(&PathBuf::from("index.html")), types::HTML);
        assert_eq!(from_path(&PathBuf::from("css/site.css")), types::CSS);
        assert_eq!(from_path(&PathBuf::from("js/app.4f2a.js")), types::JAVASCRIPT);
        assert_eq!(from_path(&PathBuf::from("logo.PNG")), types::PNG);
        assert_eq!(from_path(&PathBuf::from("fonts/a.woff2")), types::WOFF2);
        assert_eq!(from_path(&PathBuf::from("data.csv")), types::CSV);
    }

    #[test]
    fn test_unknown_defaults_to_octet_stream() {
        assert_eq!(from_path(&PathBuf::from("blob.xyz")), types::OCTET_STREAM);
        assert_eq!(from_path(&PathBuf::from("LICENSE")), types::OCTET_STREAM);
    }

    #[test]
    fn test_essence() {
        assert_eq!(essence("text/css; charset=utf-8"), "text/css");
        assert_eq!(essence("Application/JavaScript"), "application/javascript");
        assert_eq!(essence("image/png"), "image/png");
    }

    #[test]
    fn test_is_compressible() {
        assert!(is_compressible(types::CSS));
        assert!(is_compressible(types::JAVASCRIPT));
        assert!(is_compressible("text/javascript; charset=utf-8"));
        assert!(is_compressible(types::PLAIN));
        assert!(is_compressible(types::CSV));
        assert!(is_compressible(types::XML));
        assert!(!is_compressible(types::HTML));
        assert!(!is_compressible(types::PNG));
        assert!(!is_compressible(types::OCTET_STREAM));
    }

    #[test]
    fn test_minify_kind() {
        assert_eq!(minify_kind(types::JAVASCRIPT), Some(MinifyKind::Script));
        assert_eq!(minify_kind(types::JAVASCRIPT_TEXT), Some(MinifyKind::Script));
        assert_eq!(minify_kind("text/css; charset=utf-8"), Some(MinifyKind::Stylesheet));
        assert_eq!(minify_kind(types::HTML), None);
        assert_eq!(minify_kind(types::SVG), None);
    }
}
