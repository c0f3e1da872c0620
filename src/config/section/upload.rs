//! `[upload]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [upload]
//! timeout = 30    # Seconds per request
//! retries = 2     # Extra attempts on timeouts and 5xx responses
//! backoff = 500   # Milliseconds before the first retry, doubling after
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Per-request timeout in seconds.
    pub timeout: u64,

    /// Extra attempts for retryable failures, per file.
    pub retries: u32,

    /// Milliseconds before the first retry.
    pub backoff: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            retries: 2,
            backoff: 500,
        }
    }
}

pub struct UploadFields {
    pub timeout: FieldPath,
    pub retries: FieldPath,
}

impl UploadConfig {
    pub const FIELDS: UploadFields = UploadFields {
        timeout: FieldPath::new("upload.timeout"),
        retries: FieldPath::new("upload.retries"),
    };

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub const fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.timeout == 0 {
            diag.error(Self::FIELDS.timeout, "timeout must be at least 1 second");
        }
        if self.retries > 10 {
            diag.warn(
                Self::FIELDS.retries,
                format!("{} retries per file can stall a failing run", self.retries),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_defaults() {
        let config = UploadConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.retries, 2);
        assert_eq!(config.backoff(), Duration::from_millis(500));
    }

    #[test]
    fn test_parse() {
        let config = test_parse_config("[upload]\ntimeout = 5\nretries = 0\nbackoff = 0\n");
        assert_eq!(config.upload.timeout, 5);
        assert!(config.upload.backoff().is_zero());
        assert_eq!(config.upload.retries, 0);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut diag = ConfigDiagnostics::new();
        UploadConfig {
            timeout: 0,
            ..Default::default()
        }
        .validate(&mut diag);
        assert_eq!(diag.errors()[0].field, UploadConfig::FIELDS.timeout);
    }

    #[test]
    fn test_many_retries_warns() {
        let mut diag = ConfigDiagnostics::new();
        UploadConfig {
            retries: 50,
            ..Default::default()
        }
        .validate(&mut diag);
        assert!(diag.is_empty());
        assert_eq!(diag.warnings().len(), 1);
    }
}
