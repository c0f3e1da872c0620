//! Relative asset paths and storage keys.
//!
//! Manifest entries and storage keys always use `/` separators, regardless of
//! platform.

use std::path::{Component, Path};

/// A manifest path is safe when it is relative and never climbs out of root.
pub fn is_safe_relative(path: &str) -> bool {
    if path.is_empty() || path.starts_with('/') || path.starts_with('\\') {
        return false;
    }
    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Join an optional directory prefix and an asset path into a storage key.
///
/// ```ignore
/// join_key("", "css/app.css")         -> "css/app.css"
/// join_key("static/", "/css/app.css") -> "static/css/app.css"
/// ```
pub fn join_key(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let path = path.trim_start_matches('/');
    if prefix.is_empty() {
        path.to_string()
    } else {
        format!("{prefix}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_safe_relative() {
        assert!(is_safe_relative("app.css"));
        assert!(is_safe_relative("css/app.3f2a.css"));
        assert!(is_safe_relative("./img/logo.png"));
        assert!(!is_safe_relative(""));
        assert!(!is_safe_relative("/etc/passwd"));
        assert!(!is_safe_relative("../secrets.txt"));
        assert!(!is_safe_relative("css/../../up.css"));
    }

    #[test]
    fn test_join_key() {
        assert_eq!(join_key("", "css/app.css"), "css/app.css");
        assert_eq!(join_key("static", "css/app.css"), "static/css/app.css");
        assert_eq!(join_key("/static/", "/css/app.css"), "static/css/app.css");
        assert_eq!(join_key("a/b", "c.js"), "a/b/c.js");
    }
}
