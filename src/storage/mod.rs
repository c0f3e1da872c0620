//! Storage backends.
//!
//! | Engine  | Type            | Existing key        |
//! |---------|-----------------|---------------------|
//! | `local` | [`LocalStorage`] | skipped (no-op)    |
//! | `s3`    | [`S3Storage`]    | overwritten        |
//!
//! Backends are built by [`open`] from a [`StorageKind`]; there is no global
//! registry. Callers own the returned box and must call [`Storage::close`]
//! once they are done, also when the run failed.

mod error;
mod kind;
mod local;
mod s3;
mod sign;

use std::fmt;
use std::time::Duration;

use crate::pipeline::StorageHeaders;

pub use error::StorageError;
pub use kind::StorageKind;
pub use local::LocalStorage;
pub use s3::{Credentials, S3Storage};

/// Whether a commit wrote bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStatus {
    Written,
    /// Destination already existed and was left untouched.
    AlreadyPresent,
}

/// Where an upload landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    pub location: String,
    pub status: CommitStatus,
}

impl Committed {
    pub fn written(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            status: CommitStatus::Written,
        }
    }

    pub fn already_present(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            status: CommitStatus::AlreadyPresent,
        }
    }
}

/// Commits files to a destination.
pub trait Storage {
    /// Store `content` under `key` with `headers`.
    fn upload(
        &mut self,
        content: &[u8],
        key: &str,
        headers: &StorageHeaders,
    ) -> Result<Committed, StorageError>;

    /// Release held connections. Uploads after close fail with [`StorageError::Closed`].
    fn close(&mut self) -> Result<(), StorageError>;

    /// Human-readable target, e.g. `s3://bucket`.
    fn describe(&self) -> String;
}

/// Backend construction options.
#[derive(Debug, Clone)]
pub struct StorageOptions {
    /// Per-request timeout (object store only).
    pub timeout: Duration,
    /// Object store region. Falls back to `AWS_REGION`, then `us-east-1`.
    pub region: Option<String>,
    /// Custom S3-compatible endpoint; switches to path-style addressing.
    pub endpoint: Option<String>,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            region: None,
            endpoint: None,
        }
    }
}

/// Build a backend for `kind`.
///
/// `bucket` is the bucket name for `s3` and the destination directory for
/// `local`. Configuration problems (missing credentials, bad endpoint) fail
/// here, before anything is uploaded.
pub fn open(
    kind: StorageKind,
    bucket: &str,
    options: &StorageOptions,
) -> Result<Box<dyn Storage>, StorageError> {
    let storage: Box<dyn Storage> = match kind {
        StorageKind::Local => Box::new(LocalStorage::new(bucket)?),
        StorageKind::S3 => Box::new(S3Storage::new(bucket, Credentials::from_env()?, options)?),
    };
    Ok(storage)
}

impl fmt::Debug for dyn Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Storage({})", self.describe())
    }
}
