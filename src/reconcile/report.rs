//! Progress reporting and the end-of-run summary.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use super::UploadTask;
use crate::storage::{Committed, StorageError};
use crate::utils::plural_count;

/// Why a single file was not published.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("failed to read `{0}`")]
    Read(PathBuf, #[source] std::io::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A file that failed and stays unpublished until a later run.
#[derive(Debug)]
pub struct Failure {
    pub path: String,
    pub error: FileError,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, error_chain(&self.error))
    }
}

/// Receives per-file progress from a publish run.
///
/// Every method has a no-op default so callers implement only what they show.
pub trait Reporter {
    /// Upload set is known; `total` files will be attempted.
    fn on_start(&mut self, _total: usize) {}

    /// File transformed, about to be uploaded.
    fn on_file(&mut self, _task: &UploadTask) {}

    /// A retryable failure; another attempt follows.
    fn on_retry(&mut self, _task: &UploadTask, _attempt: u32, _error: &StorageError) {}

    fn on_committed(&mut self, _task: &UploadTask, _committed: &Committed) {}

    fn on_failed(&mut self, _path: &str, _error: &FileError) {}
}

/// Reports through the terminal logger.
#[derive(Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn on_start(&mut self, total: usize) {
        crate::debug!("publish"; "{} to upload", plural_count(total, "file"));
    }

    fn on_file(&mut self, task: &UploadTask) {
        crate::log!("upload"; "{}", task.describe());
    }

    fn on_retry(&mut self, task: &UploadTask, attempt: u32, error: &StorageError) {
        crate::log!("retry"; "{} (attempt {}): {}", task.path, attempt + 1, error);
    }

    fn on_committed(&mut self, task: &UploadTask, committed: &Committed) {
        crate::debug!(
            "upload";
            "-> {} ({}, {:?})",
            committed.location,
            task.content_type,
            committed.status
        );
    }

    fn on_failed(&mut self, path: &str, error: &FileError) {
        crate::error!("failed"; "{}: {}", path, error_chain(error));
    }
}

/// `outer: inner: root` rendering of an error and its sources.
pub fn error_chain(error: &dyn std::error::Error) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

/// Outcome of a publish run.
#[derive(Debug, Default)]
pub struct PublishSummary {
    /// Storage target, e.g. `s3://bucket`.
    pub target: String,
    /// Files selected for upload after diffing and filtering.
    pub selected: usize,
    /// Paths whose bytes were written.
    pub uploaded: Vec<String>,
    /// Paths the backend already held (local skip).
    pub already_present: Vec<String>,
    /// Changed paths left out by the pattern filter.
    pub filtered_out: usize,
    pub failures: Vec<Failure>,
    /// Stopped early by Ctrl+C.
    pub interrupted: bool,
}

impl PublishSummary {
    /// Nothing needed uploading.
    pub fn is_unchanged(&self) -> bool {
        self.selected == 0
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Paths now recorded as published by this run.
    pub fn published(&self) -> usize {
        self.uploaded.len() + self.already_present.len()
    }
}

impl fmt::Display for PublishSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unchanged() {
            return write!(f, "no files changed on {}", self.target);
        }

        write!(
            f,
            "uploaded {} to {}",
            plural_count(self.uploaded.len(), "file"),
            self.target
        )?;
        if !self.already_present.is_empty() {
            write!(f, ", {} already present", self.already_present.len())?;
        }
        if self.filtered_out > 0 {
            write!(f, ", {} filtered out", self.filtered_out)?;
        }
        if self.has_failures() {
            write!(f, ", {} failed", self.failures.len())?;
        }
        if self.interrupted {
            let remaining = self
                .selected
                .saturating_sub(self.published() + self.failures.len());
            write!(f, " (interrupted, {} not attempted)", remaining)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(selected: usize) -> PublishSummary {
        PublishSummary {
            target: "local:/srv/static".to_string(),
            selected,
            ..Default::default()
        }
    }

    #[test]
    fn test_unchanged_line() {
        let s = summary(0);
        assert!(s.is_unchanged());
        assert_eq!(s.to_string(), "no files changed on local:/srv/static");
    }

    #[test]
    fn test_uploaded_line() {
        let mut s = summary(3);
        s.uploaded = vec!["a.css".into(), "b.css".into()];
        s.already_present = vec!["c.css".into()];
        s.filtered_out = 4;
        assert_eq!(
            s.to_string(),
            "uploaded 2 files to local:/srv/static, 1 already present, 4 filtered out"
        );
    }

    #[test]
    fn test_failed_and_interrupted_line() {
        let mut s = summary(5);
        s.uploaded = vec!["a.css".into()];
        s.failures.push(Failure {
            path: "b.css".into(),
            error: FileError::Storage(StorageError::Closed),
        });
        s.interrupted = true;
        assert_eq!(
            s.to_string(),
            "uploaded 1 file to local:/srv/static, 1 failed (interrupted, 3 not attempted)"
        );
    }

    #[test]
    fn test_error_chain() {
        let err = FileError::Read(
            PathBuf::from("a.css"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(error_chain(&err), "failed to read `a.css`: gone");
    }
}
