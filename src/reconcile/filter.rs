//! Glob filter applied to the upload set after diffing.

use glob::{MatchOptions, Pattern, PatternError};

/// `*` also crosses `/`, so `*.css` matches `css/app.css`.
const OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Keeps paths matching a glob pattern.
///
/// Non-matching paths are skipped for this run only; they are not recorded
/// as published and show up again next time.
#[derive(Debug, Clone)]
pub struct PathFilter {
    pattern: Pattern,
}

impl PathFilter {
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        Ok(Self {
            pattern: Pattern::new(pattern)?,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.pattern.matches_with(path, OPTIONS)
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}
