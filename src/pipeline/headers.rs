//! Storage headers attached to every committed object.

use std::collections::BTreeMap;
use std::fmt;

/// Header names the pipeline sets.
pub mod names {
    pub const CONTENT_TYPE: &str = "content-type";
    pub const CACHE_CONTROL: &str = "cache-control";
    pub const CONTENT_ENCODING: &str = "content-encoding";
}

/// One year, cacheable by browsers and shared caches.
///
/// Safe because every published name is content-addressed.
pub const CACHE_ONE_YEAR: &str = "public, max-age=31536000";

/// Header name -> value mapping.
///
/// Names are case-insensitive and stored lowercased; iteration order is
/// sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageHeaders(BTreeMap<String, String>);

impl StorageHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default headers for an asset: content type plus long-lived caching.
    pub fn for_asset(content_type: &str) -> Self {
        let mut headers = Self::new();
        headers.insert(names::CONTENT_TYPE, content_type);
        headers.insert(names::CACHE_CONTROL, CACHE_ONE_YEAR);
        headers
    }

    /// Set a header, replacing any previous value.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_ascii_lowercase(), value.into());
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    #[cfg(test)]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_ascii_lowercase())
    }

    #[cfg(test)]
    pub fn content_type(&self) -> Option<&str> {
        self.get(names::CONTENT_TYPE)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for StorageHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<_> = self.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        write!(f, "{}", parts.join(", "))
    }
}
