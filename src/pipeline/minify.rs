//! Script and stylesheet minification.
//!
//! The minifier is an injected capability: [`NativeMinifier`] uses oxc for
//! JavaScript and lightningcss for CSS, [`Passthrough`] stands in when none is wanted.
//! Failures never abort a publish; the caller falls back to the original bytes.

use std::path::Path;
use std::sync::LazyLock;

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{
    CompressOptions, CompressOptionsUnused, Minifier as OxcMinifier, MinifierOptions,
};
use oxc::parser::Parser;
use oxc::span::SourceType;
use regex::Regex;

use super::{Tag, TransformError};
use crate::utils::mime::{self, MinifyKind};

/// Filename markers of assets shipped already minified.
const PRE_MINIFIED_MARKERS: &[&str] = &[".min", ".pack"];

/// Inline trace statements: `console.log(...)`, `console.warn(...);`
///
/// ASCII classes only; the regex build carries no Unicode tables.
static CONSOLE_CALL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"console\.[A-Za-z0-9_$]+\(.*?\);?").ok());

/// A source minifier.
pub trait Minifier: Send + Sync {
    /// Minify `source` of the given kind.
    fn minify(&self, kind: MinifyKind, source: &str) -> Result<String, TransformError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// oxc (JavaScript) + lightningcss (CSS).
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeMinifier;

impl Minifier for NativeMinifier {
    fn minify(&self, kind: MinifyKind, source: &str) -> Result<String, TransformError> {
        match kind {
            MinifyKind::Script => minify_js(&strip_console(source)),
            MinifyKind::Stylesheet => minify_css(source),
        }
    }

    fn name(&self) -> &'static str {
        "native"
    }
}

/// Stand-in when no minifier is available: every file is skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl Minifier for Passthrough {
    fn minify(&self, _kind: MinifyKind, _source: &str) -> Result<String, TransformError> {
        Err(TransformError::Unavailable)
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }
}

/// Remove inline `console.*(...)` statements.
///
/// The match is lazy and line based, so a call with nested parentheses is
/// cut at the first `)`. The parser then rejects the result and the file is
/// uploaded unminified.
pub fn strip_console(source: &str) -> String {
    match CONSOLE_CALL.as_ref() {
        Some(re) => re.replace_all(source, "").into_owned(),
        None => source.to_string(),
    }
}

/// Check the file name (not its directories) for a pre-minified marker.
pub fn is_pre_minified(name: &str) -> bool {
    let file_name = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name);
    PRE_MINIFIED_MARKERS.iter().any(|m| file_name.contains(m))
}

/// Minify one asset.
///
/// Returns the (possibly) new content and the tag describing what happened:
/// - every type other than script or stylesheet passes through with no tag
/// - pre-minified names pass through with [`Tag::AlreadyMinified`]
/// - the rest get [`Tag::Minified`], or [`Tag::MinifySkipped`] with the
///   original bytes when the minifier fails
pub fn minify(
    minifier: &dyn Minifier,
    name: &str,
    content_type: &str,
    content: Vec<u8>,
) -> (Vec<u8>, Option<Tag>) {
    let Some(kind) = mime::minify_kind(content_type) else {
        return (content, None);
    };

    if is_pre_minified(name) {
        return (content, Some(Tag::AlreadyMinified));
    }

    let result = std::str::from_utf8(&content)
        .map_err(|_| TransformError::NotUtf8)
        .and_then(|source| minifier.minify(kind, source));

    match result {
        Ok(minified) => (minified.into_bytes(), Some(Tag::Minified)),
        Err(e) => {
            crate::debug!("minify"; "{}: {}, uploading original", name, e);
            (content, Some(Tag::MinifySkipped))
        }
    }
}

/// Minify JavaScript source code.
///
/// Sources without `import`/`export` are classic scripts: their top-level
/// `var` and `function` declarations are page globals, so they are neither
/// dropped nor renamed. ES modules get full tree-shaking and mangling.
fn minify_js(source: &str) -> Result<String, TransformError> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::unambiguous()).parse();
    if let Some(first) = ret.errors.first() {
        return Err(TransformError::Parse {
            kind: MinifyKind::Script,
            message: first.to_string(),
        });
    }
    let mut program = ret.program;
    let is_module = program.source_type.is_module();

    let compress = if is_module {
        CompressOptions::smallest()
    } else {
        CompressOptions {
            unused: CompressOptionsUnused::Keep,
            ..CompressOptions::smallest()
        }
    };
    let options = MinifierOptions {
        mangle: Some(MangleOptions {
            top_level: Some(is_module),
            ..MangleOptions::default()
        }),
        compress: Some(compress),
    };
    let ret = OxcMinifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

/// Minify CSS source code.
fn minify_css(source: &str) -> Result<String, TransformError> {
    let parse_error = |message: String| TransformError::Parse {
        kind: MinifyKind::Stylesheet,
        message,
    };
    let stylesheet =
        StyleSheet::parse(source, ParserOptions::default()).map_err(|e| parse_error(e.to_string()))?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| parse_error(e.to_string()))?;
    Ok(result.code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::mime::types;

    /// Always fails, to exercise the fallback path.
    struct Broken;

    impl Minifier for Broken {
        fn minify(&self, kind: MinifyKind, _source: &str) -> Result<String, TransformError> {
            Err(TransformError::Parse {
                kind,
                message: "boom".into(),
            })
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    #[test]
    fn test_is_pre_minified() {
        assert!(is_pre_minified("jquery.min.js"));
        assert!(is_pre_minified("vendor/lib.pack.js"));
        assert!(is_pre_minified("css/bootstrap.min.3f2a.css"));
        assert!(!is_pre_minified("app.js"));
        // markers in directory names don't count
        assert!(!is_pre_minified("lib.min/app.js"));
    }

    #[test]
    fn test_strip_console() {
        let source = "var a = 1;console.log(\"hi\");var b = 2;console.debug(a, b)\n";
        let stripped = strip_console(source);
        assert!(!stripped.contains("console"));
        assert!(stripped.contains("var a = 1;"));
        assert!(stripped.contains("var b = 2;"));
    }

    #[test]
    fn test_console_pattern_builds() {
        assert!(CONSOLE_CALL.is_some());
    }

    #[test]
    fn test_minify_js_module() {
        let source = "function add(first, second) {\n    // sum\n    return first + second;\n}\nexport { add };\n";
        let (out, tag) = minify(&NativeMinifier, "app.js", types::JAVASCRIPT, source.as_bytes().to_vec());
        assert_eq!(tag, Some(Tag::Minified));
        let out = String::from_utf8(out).unwrap();
        assert!(out.len() < source.len());
        assert!(out.contains("export"));
        assert!(!out.contains("// sum"));
    }

    #[test]
    fn test_minify_classic_script_keeps_globals() {
        let source = "var API_VERSION = 3;\n\nfunction initWidgets(root) {\n    // count widgets\n    var found = root.querySelectorAll('.widget');\n    return found.length;\n}\n";
        let (out, tag) = minify(&NativeMinifier, "js/widgets.js", types::JAVASCRIPT, source.as_bytes().to_vec());
        assert_eq!(tag, Some(Tag::Minified));
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("API_VERSION"));
        assert!(out.contains("initWidgets"));
        assert!(!out.contains("// count widgets"));
        assert!(out.len() < source.len());
    }

    #[test]
    fn test_minify_sloppy_script() {
        let source = "pageTitle = document.title;\nfunction legacy() {\n    return arguments.length;\n}\n";
        let (out, tag) = minify(&NativeMinifier, "legacy.js", types::JAVASCRIPT, source.as_bytes().to_vec());
        assert_eq!(tag, Some(Tag::Minified));
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("legacy"));
        assert!(out.contains("pageTitle"));
    }

    #[test]
    fn test_nested_console_call_skips_minify() {
        let source = "console.log(format(a), a);\nvar total = 1;\n";
        assert_eq!(strip_console(source), ", a);\nvar total = 1;\n");

        let (out, tag) = minify(&NativeMinifier, "trace.js", types::JAVASCRIPT, source.as_bytes().to_vec());
        assert_eq!(tag, Some(Tag::MinifySkipped));
        assert_eq!(out, source.as_bytes());
    }

    #[test]
    fn test_minify_js_strips_console() {
        let source = "export function f(x) {\n  console.log(x);\n  return x * 2;\n}\n";
        let (out, tag) = minify(&NativeMinifier, "f.js", types::JAVASCRIPT, source.as_bytes().to_vec());
        assert_eq!(tag, Some(Tag::Minified));
        assert!(!String::from_utf8(out).unwrap().contains("console"));
    }

    #[test]
    fn test_minify_css() {
        let source = "body {\n    color: red;\n    margin: 0px;\n}\n";
        let (out, tag) = minify(&NativeMinifier, "site.css", types::CSS, source.as_bytes().to_vec());
        assert_eq!(tag, Some(Tag::Minified));
        let out = String::from_utf8(out).unwrap();
        assert!(!out.contains('\n'));
        assert!(out.starts_with("body{"));
    }

    #[test]
    fn test_pre_minified_passthrough() {
        let source = b"body {  color: red; }".to_vec();
        let (out, tag) = minify(&NativeMinifier, "site.min.css", types::CSS, source.clone());
        assert_eq!(tag, Some(Tag::AlreadyMinified));
        assert_eq!(out, source);
    }

    #[test]
    fn test_other_types_untouched() {
        let source = b"\x89PNG\r\n".to_vec();
        let (out, tag) = minify(&NativeMinifier, "logo.png", types::PNG, source.clone());
        assert_eq!(tag, None);
        assert_eq!(out, source);
    }

    #[test]
    fn test_failure_falls_back_to_original() {
        let source = b"body { color: red; }".to_vec();
        let (out, tag) = minify(&Broken, "site.css", types::CSS, source.clone());
        assert_eq!(tag, Some(Tag::MinifySkipped));
        assert_eq!(out, source);
    }

    #[test]
    fn test_invalid_js_falls_back_to_original() {
        let source = b"function ( {".to_vec();
        let (out, tag) = minify(&NativeMinifier, "bad.js", types::JAVASCRIPT, source.clone());
        assert_eq!(tag, Some(Tag::MinifySkipped));
        assert_eq!(out, source);
    }

    #[test]
    fn test_non_utf8_script_skipped() {
        let source = vec![0xff, 0xfe, 0x00];
        let (out, tag) = minify(&NativeMinifier, "weird.js", types::JAVASCRIPT, source.clone());
        assert_eq!(tag, Some(Tag::MinifySkipped));
        assert_eq!(out, source);
    }

    #[test]
    fn test_passthrough_skips() {
        let source = b"a { }".to_vec();
        let (out, tag) = minify(&Passthrough, "a.css", types::CSS, source.clone());
        assert_eq!(tag, Some(Tag::MinifySkipped));
        assert_eq!(out, source);
    }
}
