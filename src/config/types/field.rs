//! Config field paths used in diagnostics.

/// Dotted path of a config field, e.g. `publish.bucket`.
///
/// Each section exposes its paths as a `FIELDS` constant:
///
/// ```ignore
/// diag.error(PublishConfig::FIELDS.bucket, "required");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(pub &'static str);

impl FieldPath {
    #[inline]
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}
