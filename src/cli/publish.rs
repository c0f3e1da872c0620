//! `statik publish`: upload changed assets and update the ledger.

use anyhow::{Context, Result, bail};

use crate::config::StatikConfig;
use crate::manifest::BuildManifest;
use crate::reconcile::{LogReporter, PublishSummary};
use crate::storage::{self, Storage};
use crate::utils::plural_count;
use crate::{debug, log};

/// Run a publish with the configured backend.
///
/// The manifest is loaded and the backend opened before anything is read
/// from disk, so configuration problems abort with nothing uploaded. The
/// backend is closed on every path once it is open.
pub fn publish(config: &StatikConfig) -> Result<()> {
    let engine = config.engine()?;
    let bucket = config.bucket()?;

    let manifest = BuildManifest::load(config.manifest_path())?;
    debug!("manifest"; "{} entries in {}", manifest.len(), config.manifest_path().display());

    let ledger = config.ledger()?;
    let reconciler = config.reconciler()?;
    debug!("publish"; "{:?}", reconciler);

    let mut storage = storage::open(engine, bucket, &config.storage_options())
        .with_context(|| format!("failed to open {engine} storage"))?;

    let summary = run_and_close(storage.as_mut(), |storage| {
        reconciler.publish(&manifest, &ledger, storage, &mut LogReporter)
    })?;

    report(&summary)
}

/// Run `f` against `storage`, then close it whatever `f` returned.
pub fn run_and_close<T, E>(
    storage: &mut dyn Storage,
    f: impl FnOnce(&mut dyn Storage) -> Result<T, E>,
) -> Result<T>
where
    E: Into<anyhow::Error>,
{
    let result = f(storage).map_err(Into::into);
    if let Err(e) = storage.close() {
        crate::error!("storage"; "failed to close {}: {}", storage.describe(), e);
    }
    result
}

/// Print the summary, list failed files, and turn failures into a non-zero
/// exit.
fn report(summary: &PublishSummary) -> Result<()> {
    log!("publish"; "{}", summary);

    for failure in &summary.failures {
        crate::error!("failed"; "{}", failure);
    }
    if summary.has_failures() {
        bail!(
            "{} not published; they will be retried on the next run",
            plural_count(summary.failures.len(), "file")
        );
    }
    if summary.interrupted {
        bail!("publish interrupted");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::StorageHeaders;
    use crate::reconcile::{Failure, FileError};
    use crate::storage::{Committed, LocalStorage, StorageError};
    use std::fs;
    use tempfile::TempDir;

    struct Tracked {
        closed: bool,
    }

    impl Storage for Tracked {
        fn upload(
            &mut self,
            _content: &[u8],
            key: &str,
            _headers: &StorageHeaders,
        ) -> Result<Committed, StorageError> {
            Ok(Committed::written(key))
        }

        fn close(&mut self) -> Result<(), StorageError> {
            self.closed = true;
            Ok(())
        }

        fn describe(&self) -> String {
            "tracked".into()
        }
    }

    #[test]
    fn test_close_on_success_and_error() {
        let mut storage = Tracked { closed: false };
        let ok: Result<u8> = run_and_close(&mut storage, |_| Ok::<_, StorageError>(1));
        assert_eq!(ok.unwrap(), 1);
        assert!(storage.closed);

        let mut storage = Tracked { closed: false };
        let err: Result<()> = run_and_close(&mut storage, |_| Err(StorageError::Closed));
        assert!(err.is_err());
        assert!(storage.closed);
    }

    #[test]
    fn test_report_failures_exit_non_zero() {
        let mut summary = PublishSummary {
            target: "t".into(),
            selected: 1,
            ..Default::default()
        };
        assert!(report(&summary).is_ok());

        summary.failures.push(Failure {
            path: "a.css".into(),
            error: FileError::Storage(StorageError::Closed),
        });
        assert_eq!(summary.failures[0].to_string(), "a.css: storage is closed");
        let err = report(&summary).unwrap_err();
        assert!(err.to_string().contains("1 file not published"));
    }

    #[test]
    fn test_report_interrupted_exit_non_zero() {
        let summary = PublishSummary {
            selected: 2,
            interrupted: true,
            ..Default::default()
        };
        assert!(report(&summary).is_err());
    }

    #[test]
    fn test_publish_to_local_end_to_end() {
        let site = TempDir::new().unwrap();
        let root = site.path().join("static");
        let dest = site.path().join("public");
        fs::create_dir_all(root.join("css")).unwrap();
        fs::write(root.join("css/app.css"), "a {  color: blue; }").unwrap();
        fs::write(root.join("css/app.1f.css"), "a {  color: blue; }").unwrap();
        fs::write(
            root.join("staticfiles.json"),
            r#"{"version": "1.1", "paths": {"css/app.css": "css/app.1f.css"}}"#,
        )
        .unwrap();

        let mut config = crate::config::test_parse_config(&format!(
            "[publish]\nroot = \"{}\"\nengine = \"local\"\nbucket = \"{}\"\nprefix = \"v1\"\nminify = false\n",
            root.display(),
            dest.display()
        ));
        config.publish.normalize(site.path());

        publish(&config).unwrap();

        assert_eq!(
            fs::read_to_string(dest.join("v1/css/app.css")).unwrap(),
            "a {  color: blue; }"
        );
        assert!(dest.join("v1/css/app.1f.css").is_file());
        let ledger = config.ledger().unwrap().load().unwrap().into_set();
        assert_eq!(ledger.len(), 2);

        // Second run finds nothing to do and leaves the destination alone.
        let mut local = LocalStorage::new(&dest).unwrap();
        let summary = config
            .reconciler()
            .unwrap()
            .with_stop(|| false)
            .publish(
                &BuildManifest::load(config.manifest_path()).unwrap(),
                &config.ledger().unwrap(),
                &mut local,
                &mut LogReporter,
            )
            .unwrap();
        assert!(summary.is_unchanged());
    }

    #[test]
    fn test_missing_manifest_uploads_nothing() {
        let site = TempDir::new().unwrap();
        let dest = site.path().join("public");
        let mut config = crate::config::test_parse_config(&format!(
            "[publish]\nroot = \"{}\"\nengine = \"local\"\nbucket = \"{}\"\n",
            site.path().display(),
            dest.display()
        ));
        config.publish.normalize(site.path());

        let err = publish(&config).unwrap_err();
        assert!(err.to_string().contains("run the asset build"));
        assert!(!dest.exists());
    }
}
