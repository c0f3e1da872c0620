//! Build manifest: logical asset path -> content-addressed path.
//!
//! The manifest is produced by the asset build and is read-only here:
//!
//! ```json
//! { "version": "1.1", "paths": { "css/app.css": "css/app.3f2a9c.css" } }
//! ```
//!
//! A missing or malformed manifest means the build step did not run, so every
//! error in this module is fatal.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::utils::path::is_safe_relative;

/// Manifest versions this tool understands (absent is accepted too).
pub const SUPPORTED_VERSIONS: &[&str] = &["1.0", "1.1"];

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("build manifest not found at `{0}`; run the asset build first")]
    NotFound(PathBuf),

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("build manifest `{0}` is not valid")]
    Parse(PathBuf, #[source] serde_json::Error),

    #[error(
        "unsupported build manifest version `{0}` (expected one of {expected})",
        expected = SUPPORTED_VERSIONS.join(", ")
    )]
    UnsupportedVersion(String),

    #[error("build manifest entry `{0}` is not a relative path inside the asset root")]
    UnsafePath(String),
}

#[derive(Debug, Deserialize)]
struct ManifestFile {
    paths: BTreeMap<String, String>,
    #[serde(default)]
    version: Option<String>,
}

/// Parsed build manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildManifest {
    entries: BTreeMap<String, String>,
}

impl BuildManifest {
    /// Load and validate a manifest file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ManifestError::NotFound(path.to_path_buf()),
            _ => ManifestError::Io(path.to_path_buf(), e),
        })?;
        Self::parse(&content, path)
    }

    fn parse(json: &str, origin: &Path) -> Result<Self, ManifestError> {
        let file: ManifestFile =
            serde_json::from_str(json).map_err(|e| ManifestError::Parse(origin.to_path_buf(), e))?;
        Self::from_file(file)
    }

    #[cfg(test)]
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        Self::parse(json, Path::new("<inline>"))
    }

    /// Build from `(logical, hashed)` pairs without validation.
    #[cfg(test)]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    fn from_file(file: ManifestFile) -> Result<Self, ManifestError> {
        if let Some(version) = &file.version
            && !SUPPORTED_VERSIONS.contains(&version.as_str())
        {
            return Err(ManifestError::UnsupportedVersion(version.clone()));
        }

        for (logical, hashed) in &file.paths {
            for path in [logical, hashed] {
                if !is_safe_relative(path) {
                    return Err(ManifestError::UnsafePath(path.clone()));
                }
            }
        }

        Ok(Self {
            entries: file.paths,
        })
    }

    /// Every path the manifest names, logical and hashed.
    pub fn all_paths(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .flat_map(|(logical, hashed)| [logical.clone(), hashed.clone()])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
