//! `[publish]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [publish]
//! root = "static"                 # Built assets and the manifest
//! manifest = "staticfiles.json"   # Relative to root
//! engine = "s3"                   # local | s3
//! bucket = "assets.example.com"   # Bucket name, or directory for `local`
//! prefix = "static"               # Optional key prefix
//! minify = true
//! gzip = false
//! pattern = "*.css"               # Optional glob filter
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::reconcile::PathFilter;
use crate::storage::StorageKind;

/// Asset build mode that produces a manifest this tool can read.
pub const MANIFEST_BUILD_STORAGE: &str = "manifest";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Directory holding the built assets.
    pub root: Option<PathBuf>,

    /// Build manifest, relative to `root`.
    pub manifest: PathBuf,

    /// Ledger file. Defaults to `publishfiles.<engine>.json` inside `root`.
    pub ledger: Option<PathBuf>,

    pub engine: Option<StorageKind>,

    /// Bucket name (`s3`) or destination directory (`local`).
    pub bucket: Option<String>,

    /// Directory prefix for every storage key.
    pub prefix: String,

    pub minify: bool,

    pub gzip: bool,

    /// Glob pattern; only matching changed files are uploaded.
    pub pattern: Option<String>,

    /// How the asset build stored its output. Must be `manifest`.
    pub build_storage: String,

    /// Ignore the ledger and upload everything (CLI only).
    #[serde(skip)]
    pub overwrite: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            root: None,
            manifest: PathBuf::from("staticfiles.json"),
            ledger: None,
            engine: None,
            bucket: None,
            prefix: String::new(),
            minify: true,
            gzip: false,
            pattern: None,
            build_storage: MANIFEST_BUILD_STORAGE.to_string(),
            overwrite: false,
        }
    }
}

pub struct PublishFields {
    pub root: FieldPath,
    pub engine: FieldPath,
    pub bucket: FieldPath,
    pub pattern: FieldPath,
    pub build_storage: FieldPath,
}

impl PublishConfig {
    pub const FIELDS: PublishFields = PublishFields {
        root: FieldPath::new("publish.root"),
        engine: FieldPath::new("publish.engine"),
        bucket: FieldPath::new("publish.bucket"),
        pattern: FieldPath::new("publish.pattern"),
        build_storage: FieldPath::new("publish.build_storage"),
    };

    /// Resolve `root`, `manifest` and `ledger` to absolute paths, and the
    /// bucket too when it names a local directory.
    pub fn normalize(&mut self, base: &Path) {
        if self.engine == Some(StorageKind::Local)
            && let Some(bucket) = self.bucket.take()
        {
            self.bucket = Some(Self::resolve_directory(&bucket, base));
        }

        let Some(root) = self.root.take() else {
            return;
        };
        let root = crate::utils::path::expand_path(&root, base);
        self.manifest = crate::utils::path::expand_path(&self.manifest, &root);
        if let Some(ledger) = self.ledger.take() {
            self.ledger = Some(crate::utils::path::expand_path(&ledger, &root));
        }
        self.root = Some(root);
    }

    /// Expand and resolve a local destination directory. Blank values are
    /// left for validation to report.
    pub fn resolve_directory(bucket: &str, base: &Path) -> String {
        if bucket.trim().is_empty() {
            return bucket.to_string();
        }
        crate::utils::path::expand_path(Path::new(bucket), base)
            .to_string_lossy()
            .into_owned()
    }

    /// Compiled glob filter, if a valid pattern is set.
    pub fn filter(&self) -> Option<PathFilter> {
        self.pattern.as_deref().and_then(|p| PathFilter::new(p).ok())
    }

    /// Checks every command needs.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.root.is_none() {
            diag.error_with_hint(
                Self::FIELDS.root,
                "asset root is not set",
                "set `publish.root` or pass --root",
            );
        }

        if self.engine.is_none() {
            diag.error_with_hint(
                Self::FIELDS.engine,
                "storage engine is not set",
                "set `publish.engine` to `local` or `s3`, or pass --engine",
            );
        }

        if self.build_storage != MANIFEST_BUILD_STORAGE {
            diag.error_with_hint(
                Self::FIELDS.build_storage,
                format!(
                    "build storage `{}` does not produce a manifest",
                    self.build_storage
                ),
                format!("configure the asset build to emit `{MANIFEST_BUILD_STORAGE}` output"),
            );
        }

        if let Some(pattern) = &self.pattern
            && let Err(e) = PathFilter::new(pattern)
        {
            diag.error(
                Self::FIELDS.pattern,
                format!("invalid glob pattern `{pattern}`: {e}"),
            );
        }
    }

    /// Extra checks for commands that upload.
    pub fn validate_upload(&self, diag: &mut ConfigDiagnostics) {
        match self.bucket.as_deref().map(str::trim) {
            None | Some("") => diag.error_with_hint(
                Self::FIELDS.bucket,
                "bucket is not set",
                "set `publish.bucket` or pass --bucket",
            ),
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_defaults() {
        let config = PublishConfig::default();
        assert!(config.minify);
        assert!(!config.gzip);
        assert_eq!(config.manifest, PathBuf::from("staticfiles.json"));
        assert_eq!(config.build_storage, "manifest");
    }

    #[test]
    fn test_parse_full_section() {
        let config = test_parse_config(
            r#"
[publish]
root = "static"
engine = "object-store"
bucket = "assets"
prefix = "v1"
gzip = true
pattern = "*.js"
"#,
        );
        let publish = config.publish;
        assert_eq!(publish.engine, Some(StorageKind::S3));
        assert_eq!(publish.bucket.as_deref(), Some("assets"));
        assert!(publish.gzip && publish.minify);
        assert!(publish.filter().unwrap().matches("js/app.js"));
    }

    #[test]
    fn test_validate_collects_everything() {
        let config = PublishConfig {
            build_storage: "plain".into(),
            pattern: Some("[".into()),
            ..Default::default()
        };
        let mut diag = ConfigDiagnostics::new();
        config.validate(&mut diag);
        config.validate_upload(&mut diag);

        let fields: Vec<_> = diag.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "publish.root",
                "publish.engine",
                "publish.build_storage",
                "publish.pattern",
                "publish.bucket"
            ]
        );
    }

    #[test]
    fn test_blank_bucket_is_unset() {
        let config = PublishConfig {
            bucket: Some("  ".into()),
            ..Default::default()
        };
        let mut diag = ConfigDiagnostics::new();
        config.validate_upload(&mut diag);
        assert_eq!(diag.len(), 1);
    }

    #[test]
    fn test_normalize_resolves_local_bucket() {
        let mut config = PublishConfig {
            engine: Some(StorageKind::Local),
            bucket: Some("public".into()),
            ..Default::default()
        };
        config.normalize(Path::new("/srv/site"));
        assert_eq!(config.bucket.as_deref(), Some("/srv/site/public"));

        let mut config = PublishConfig {
            engine: Some(StorageKind::Local),
            bucket: Some("~/public".into()),
            ..Default::default()
        };
        config.normalize(Path::new("/srv/site"));
        let bucket = config.bucket.unwrap();
        assert!(Path::new(&bucket).is_absolute());
        if std::env::var_os("HOME").is_some() {
            assert!(!bucket.contains('~'));
        }
    }

    #[test]
    fn test_normalize_keeps_s3_bucket() {
        let mut config = PublishConfig {
            engine: Some(StorageKind::S3),
            bucket: Some("assets.example.com".into()),
            ..Default::default()
        };
        config.normalize(Path::new("/srv/site"));
        assert_eq!(config.bucket.as_deref(), Some("assets.example.com"));
    }

    #[test]
    fn test_normalize_resolves_against_root() {
        let mut config = PublishConfig {
            root: Some(PathBuf::from("static")),
            ledger: Some(PathBuf::from("state/ledger.json")),
            ..Default::default()
        };
        config.normalize(Path::new("/srv/site"));

        assert_eq!(config.root.as_deref(), Some(Path::new("/srv/site/static")));
        assert_eq!(config.manifest, PathBuf::from("/srv/site/static/staticfiles.json"));
        assert_eq!(
            config.ledger.as_deref(),
            Some(Path::new("/srv/site/static/state/ledger.json"))
        );
    }
}
