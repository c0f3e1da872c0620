use crate::pipeline::{StorageHeaders, Tag, Transformed, format_tags};

/// One file ready for upload. Built per run and dropped after the attempt.
#[derive(Debug, Clone)]
pub struct UploadTask {
    /// Manifest path, logical or hashed.
    pub path: String,
    /// Destination key (prefix + path).
    pub key: String,
    pub content: Vec<u8>,
    pub content_type: &'static str,
    pub headers: StorageHeaders,
    pub tags: Vec<Tag>,
}

impl UploadTask {
    pub fn new(path: impl Into<String>, key: impl Into<String>, transformed: Transformed) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
            content: transformed.content,
            content_type: transformed.content_type,
            headers: transformed.headers,
            tags: transformed.tags,
        }
    }

    /// `css/app.css [minified, gzipped]`
    pub fn describe(&self) -> String {
        let tags = format_tags(&self.tags);
        if tags.is_empty() {
            self.path.clone()
        } else {
            format!("{} {}", self.path, tags)
        }
    }
}
