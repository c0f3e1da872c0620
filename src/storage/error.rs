//! Storage error types.

use std::path::PathBuf;

use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Required credential is not set. Surfaced before any upload.
    #[error("missing required environment variable `{0}`")]
    MissingCredential(&'static str),

    #[error("invalid storage configuration: {0}")]
    Config(String),

    #[error("IO error at `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("request to `{url}` timed out")]
    Timeout { url: String },

    #[error("request to `{url}` failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("`{key}` rejected with status {status}: {body}")]
    Rejected {
        key: String,
        status: u16,
        body: String,
    },

    #[error("storage is closed")]
    Closed,
}

impl StorageError {
    /// Failures worth another attempt for the same file.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Transport { .. } => true,
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Failures that mean the run cannot start at all.
    #[cfg(test)]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::MissingCredential(_) | Self::Config(_))
    }
}
