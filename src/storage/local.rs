//! Local directory storage, a development stand-in for a remote store.

use std::fs;
use std::path::PathBuf;

use super::{Committed, Storage, StorageError};
use crate::pipeline::StorageHeaders;

/// Writes files under a root directory.
///
/// Existing files are never overwritten: uploading to a taken key is a no-op
/// that reports the existing location.
#[derive(Debug)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Create the root directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StorageError::Io(root.clone(), e))?;
        Ok(Self { root })
    }

    #[cfg(test)]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl Storage for LocalStorage {
    fn upload(
        &mut self,
        content: &[u8],
        key: &str,
        _headers: &StorageHeaders,
    ) -> Result<Committed, StorageError> {
        let location = self.root.join(key);
        let display = location.display().to_string();

        if location.is_file() {
            return Ok(Committed::already_present(display));
        }

        if let Some(parent) = location.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::Io(parent.to_path_buf(), e))?;
        }
        fs::write(&location, content).map_err(|e| StorageError::Io(location.clone(), e))?;

        Ok(Committed::written(display))
    }

    fn close(&mut self) -> Result<(), StorageError> {
        Ok(())
    }

    fn describe(&self) -> String {
        format!("local:{}", self.root.display())
    }
}
