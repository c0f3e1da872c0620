//! Incremental publish: diff the build manifest against the ledger, then
//! transform and upload what changed.
//!
//! ```text
//! manifest ─┐
//!           ├─► upload set ─► filter ─► per file: read → pipeline → upload
//! ledger ───┘                                              │
//!    ▲                                                     │ success
//!    └──────────────── save once at the end ◄──────────────┘
//! ```
//!
//! Files are processed one at a time in path order. A failing file is
//! reported and left out of the ledger so the next run retries it; the rest
//! of the batch continues.

mod filter;
mod report;
mod task;


use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::ledger::{Ledger, LedgerError, PublishedSet};
use crate::manifest::BuildManifest;
use crate::pipeline::Pipeline;
use crate::storage::{CommitStatus, Committed, Storage, StorageError};
use crate::utils::{mime, path::join_key};

pub use filter::PathFilter;
pub use report::{Failure, FileError, LogReporter, PublishSummary, Reporter};
pub use task::UploadTask;

/// Every manifest path, logical and hashed, not yet in `published`.
pub fn determine_upload_set(manifest: &BuildManifest, published: &PublishedSet) -> BTreeSet<String> {
    manifest
        .all_paths()
        .into_iter()
        .filter(|path| !published.contains(path))
        .collect()
}

/// Longest wait between two attempts at one file.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// A file `plan` would upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub path: String,
    pub key: String,
    pub content_type: &'static str,
    pub minify: bool,
    pub gzip: bool,
}

/// Dry-run result.
#[derive(Debug, Default)]
pub struct Plan {
    pub files: Vec<PlannedFile>,
    pub filtered_out: usize,
    /// Size of the published set the diff ran against.
    pub already_published: usize,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Drives one publish run.
pub struct Reconciler {
    root: PathBuf,
    prefix: String,
    pipeline: Pipeline,
    filter: Option<PathFilter>,
    overwrite: bool,
    retries: u32,
    backoff: Duration,
    stop: Box<dyn Fn() -> bool>,
}

impl Reconciler {
    /// Reconciler reading files from `root`. Stops early on Ctrl+C.
    pub fn new(root: impl Into<PathBuf>, pipeline: Pipeline) -> Self {
        Self {
            root: root.into(),
            prefix: String::new(),
            pipeline,
            filter: None,
            overwrite: false,
            retries: 0,
            backoff: Duration::from_millis(500),
            stop: Box::new(crate::core::is_shutdown),
        }
    }

    /// Directory prefix prepended to every storage key.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_filter(mut self, filter: Option<PathFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Ignore the ledger and upload everything.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Extra attempts for retryable storage failures.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Delay before the first retry; doubles on each further one, up to
    /// [`MAX_BACKOFF`].
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Checked before each file; returning `true` ends the run early.
    #[cfg(test)]
    pub fn with_stop(mut self, stop: impl Fn() -> bool + 'static) -> Self {
        self.stop = Box::new(stop);
        self
    }

    /// Publish every changed file and save the ledger once.
    ///
    /// Only ledger I/O is fatal here. Read and storage failures are collected
    /// in the summary; the ledger is saved either way.
    pub fn publish(
        &self,
        manifest: &BuildManifest,
        ledger: &Ledger,
        storage: &mut dyn Storage,
        reporter: &mut dyn Reporter,
    ) -> Result<PublishSummary, LedgerError> {
        let mut published = self.load_published(ledger)?;
        let (selected, filtered_out) = self.select(determine_upload_set(manifest, &published));

        let mut summary = PublishSummary {
            target: storage.describe(),
            selected: selected.len(),
            filtered_out,
            ..Default::default()
        };
        reporter.on_start(selected.len());

        for path in selected {
            if (self.stop)() {
                summary.interrupted = true;
                break;
            }

            match self.publish_file(&path, storage, reporter) {
                Ok(committed) => {
                    published.insert(path.clone());
                    match committed.status {
                        CommitStatus::Written => summary.uploaded.push(path),
                        CommitStatus::AlreadyPresent => summary.already_present.push(path),
                    }
                }
                Err(error) => {
                    reporter.on_failed(&path, &error);
                    summary.failures.push(Failure { path, error });
                }
            }
        }

        ledger.save(&published)?;
        Ok(summary)
    }

    /// Compute what [`publish`](Self::publish) would upload. Reads the ledger,
    /// never writes it.
    pub fn plan(&self, manifest: &BuildManifest, ledger: &Ledger) -> Result<Plan, LedgerError> {
        let published = self.load_published(ledger)?;
        let (selected, filtered_out) = self.select(determine_upload_set(manifest, &published));

        let files = selected
            .into_iter()
            .map(|path| {
                let content_type = mime::from_path(std::path::Path::new(&path));
                PlannedFile {
                    key: join_key(&self.prefix, &path),
                    content_type,
                    minify: self.pipeline.would_minify(&path, content_type),
                    gzip: self.pipeline.would_gzip(content_type),
                    path,
                }
            })
            .collect();

        Ok(Plan {
            files,
            filtered_out,
            already_published: published.len(),
        })
    }

    fn load_published(&self, ledger: &Ledger) -> Result<PublishedSet, LedgerError> {
        if self.overwrite {
            crate::debug!("ledger"; "overwrite: ignoring {}", ledger.path().display());
            return Ok(PublishedSet::new());
        }
        Ok(ledger.load()?.into_set())
    }

    /// Apply the filter. Returns the kept paths and how many were dropped.
    fn select(&self, changed: BTreeSet<String>) -> (Vec<String>, usize) {
        let Some(filter) = &self.filter else {
            return (changed.into_iter().collect(), 0);
        };
        let total = changed.len();
        let kept: Vec<_> = changed.into_iter().filter(|p| filter.matches(p)).collect();
        let dropped = total - kept.len();
        if dropped > 0 {
            crate::debug!("filter"; "{} of {} changed files do not match `{}`", dropped, total, filter.as_str());
        }
        (kept, dropped)
    }

    fn publish_file(
        &self,
        path: &str,
        storage: &mut dyn Storage,
        reporter: &mut dyn Reporter,
    ) -> Result<Committed, FileError> {
        let source = self.root.join(path);
        let content = fs::read(&source).map_err(|e| FileError::Read(source.clone(), e))?;

        let transformed = self.pipeline.process(path, content);
        let task = UploadTask::new(path, join_key(&self.prefix, path), transformed);
        reporter.on_file(&task);

        let committed = self.upload_with_retry(storage, &task, reporter)?;
        reporter.on_committed(&task, &committed);
        Ok(committed)
    }

    fn upload_with_retry(
        &self,
        storage: &mut dyn Storage,
        task: &UploadTask,
        reporter: &mut dyn Reporter,
    ) -> Result<Committed, StorageError> {
        let mut attempt = 0;
        loop {
            match storage.upload(&task.content, &task.key, &task.headers) {
                Ok(committed) => return Ok(committed),
                Err(e) if e.is_retryable() && attempt < self.retries => {
                    reporter.on_retry(task, attempt, &e);
                    let delay = self.backoff_delay(attempt);
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Wait before retry number `attempt + 1`.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff
            .checked_mul(2u32.saturating_pow(attempt))
            .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
    }
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("root", &self.root)
            .field("prefix", &self.prefix)
            .field("pipeline", &self.pipeline)
            .field("filter", &self.filter)
            .field("overwrite", &self.overwrite)
            .field("retries", &self.retries)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}
