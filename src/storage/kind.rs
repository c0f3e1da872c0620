//! Storage engine selector.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of storage engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Local directory, stand-in for a remote store.
    #[serde(alias = "filesystem")]
    Local,
    /// S3-compatible object store.
    #[serde(alias = "object-store")]
    S3,
}

impl StorageKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::S3 => "s3",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown storage engine `{0}` (expected `local` or `s3`)")]
pub struct UnknownStorageKind(pub String);

impl FromStr for StorageKind {
    type Err = UnknownStorageKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "filesystem" => Ok(Self::Local),
            "s3" | "object-store" => Ok(Self::S3),
            _ => Err(UnknownStorageKind(s.to_string())),
        }
    }
}
