//! Publish ledger: the set of paths already uploaded in earlier runs.
//!
//! Persisted as `{"published_files": [...]}`, sorted for stable diffs. This is
//! the only durable state of the tool.
//!
//! A missing ledger is an empty set. A malformed ledger is also an empty set,
//! but reported as [`LedgerState::Recovered`] so the caller can log it; the
//! next publish then re-uploads everything.
//!
//! Not safe for concurrent writers: run one publish per ledger at a time.

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::StorageKind;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error when reading ledger `{0}`")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("IO error when writing ledger `{0}`")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("failed to encode ledger")]
    Encode(#[from] serde_json::Error),
}

/// Set of published paths, logical and hashed forms tracked independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishedSet(FxHashSet<String>);

impl PublishedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the path was not already present.
    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        self.0.insert(path.into())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Paths in sorted order.
    pub fn sorted(&self) -> Vec<&str> {
        let mut paths: Vec<_> = self.iter().collect();
        paths.sort_unstable();
        paths
    }
}

impl<S: Into<String>> FromIterator<S> for PublishedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// On-disk shape.
#[derive(Debug, Serialize, Deserialize)]
struct LedgerFile {
    published_files: Vec<String>,
}

/// Outcome of loading a ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerState {
    /// No ledger file yet.
    Missing,
    Loaded(PublishedSet),
    /// File exists but could not be parsed; treated as empty.
    Recovered { reason: String },
}

impl LedgerState {
    pub fn into_set(self) -> PublishedSet {
        match self {
            Self::Loaded(set) => set,
            Self::Missing | Self::Recovered { .. } => PublishedSet::new(),
        }
    }
}

/// Ledger file handle.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default file name for an engine: `publishfiles.<engine>.json`.
    pub fn file_name(kind: StorageKind) -> String {
        format!("publishfiles.{}.json", kind.as_str())
    }

    /// Default ledger inside the asset root.
    pub fn for_engine(root: &Path, kind: StorageKind) -> Self {
        Self::new(root.join(Self::file_name(kind)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the ledger. Only I/O failures other than "not found" are errors.
    pub fn load(&self) -> Result<LedgerState, LedgerError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(LedgerState::Missing),
            Err(e) => return Err(LedgerError::Read(self.path.clone(), e)),
        };

        let state = match serde_json::from_slice::<LedgerFile>(&bytes) {
            Ok(file) => {
                let set: PublishedSet = file.published_files.into_iter().collect();
                crate::debug!("ledger"; "restored {} published paths from {}", set.len(), self.path.display());
                LedgerState::Loaded(set)
            }
            Err(e) => {
                crate::debug!("ledger"; "{} is malformed ({}), treating as empty", self.path.display(), e);
                LedgerState::Recovered {
                    reason: e.to_string(),
                }
            }
        };
        Ok(state)
    }

    /// Write the ledger, replacing the previous file.
    ///
    /// Written to a sibling temp file first and renamed, so an interrupted
    /// save never leaves a truncated ledger behind.
    pub fn save(&self, set: &PublishedSet) -> Result<(), LedgerError> {
        let file = LedgerFile {
            published_files: set.sorted().into_iter().map(String::from).collect(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| LedgerError::Write(parent.to_path_buf(), e))?;
        }

        let tmp = self.tmp_path();
        fs::write(&tmp, json).map_err(|e| LedgerError::Write(tmp.clone(), e))?;
        fs::rename(&tmp, &self.path).map_err(|e| LedgerError::Write(self.path.clone(), e))?;

        crate::debug!("ledger"; "saved {} published paths to {}", set.len(), self.path.display());
        Ok(())
    }

    /// Reset to an empty set.
    pub fn clear(&self) -> Result<(), LedgerError> {
        self.save(&PublishedSet::new())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
