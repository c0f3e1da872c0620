//! Publish configuration from `statik.toml` and the command line.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── publish    # [publish]
//! │   ├── upload     # [upload]
//! │   └── storage    # [storage.s3]
//! ├── types/         # ConfigError, diagnostics, field paths
//! ├── util           # Config file lookup
//! └── mod.rs         # StatikConfig (this file)
//! ```
//!
//! The config file is optional: without one every setting comes from flags.
//! Precedence is CLI flag, then config file, then built-in default.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{PublishConfig, S3Config, StorageSectionConfig, UploadConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::cli::{Cli, Commands, PublishArgs};
use crate::ledger::Ledger;
use crate::pipeline::Pipeline;
use crate::reconcile::Reconciler;
use crate::storage::{StorageKind, StorageOptions};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name, searched upward from the working directory.
pub const CONFIG_FILE: &str = "statik.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing statik.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatikConfig {
    /// Config file in use, if any (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Directory relative paths resolve against: the config file's parent,
    /// or the working directory without a config file (internal use only)
    #[serde(skip)]
    pub base: PathBuf,

    pub publish: PublishConfig,

    pub upload: UploadConfig,

    pub storage: StorageSectionConfig,
}

impl StatikConfig {
    /// Load, apply CLI overrides, normalize paths and validate.
    ///
    /// All validation problems are reported at once; nothing is uploaded
    /// when this fails.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match Self::resolve_config_path(cli)? {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.base = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| cwd.clone());
                config.config_path = Some(path);
                config
            }
            None => {
                crate::debug!("config"; "no {} found, using flags and defaults", CONFIG_FILE);
                Self {
                    base: cwd.clone(),
                    ..Self::default()
                }
            }
        };

        config.apply_cli(cli, &cwd);
        config.publish.normalize(&config.base);
        config.validate(&cli.command)?;
        Ok(config)
    }

    /// Find the config file. An explicit `--config` must exist.
    fn resolve_config_path(cli: &Cli) -> Result<Option<PathBuf>> {
        match &cli.config {
            Some(path) => match find_config_file(path) {
                Some(found) => Ok(Some(crate::utils::path::normalize_path(&found))),
                None => Err(ConfigError::NotFound(path.clone()).into()),
            },
            None => Ok(find_config_file(Path::new(CONFIG_FILE))
                .map(|p| crate::utils::path::normalize_path(&p))),
        }
    }

    /// Load configuration from file path with unknown field detection.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        crate::log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            crate::log!("warning"; "- {}", field);
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply global flags and command options.
    fn apply_cli(&mut self, cli: &Cli, cwd: &Path) {
        // A --root flag is relative to where the command runs, not the config
        if let Some(root) = &cli.root {
            self.publish.root = Some(crate::utils::path::expand_path(root, cwd));
        }
        if let Some(engine) = cli.engine {
            self.publish.engine = Some(engine);
        }

        match &cli.command {
            Commands::Publish { args } | Commands::Plan { args } => {
                self.apply_publish_args(args, cwd)
            }
            Commands::Reset => {}
        }
    }

    fn apply_publish_args(&mut self, args: &PublishArgs, cwd: &Path) {
        if let Some(bucket) = &args.bucket {
            // A local destination on the command line is relative to cwd too
            self.publish.bucket = Some(match self.publish.engine {
                Some(StorageKind::Local) => PublishConfig::resolve_directory(bucket, cwd),
                _ => bucket.clone(),
            });
        }
        if let Some(pattern) = &args.pattern {
            self.publish.pattern = Some(pattern.clone());
        }
        Self::update_option(&mut self.publish.prefix, args.directory.as_ref());
        Self::update_option(&mut self.publish.minify, args.minify.as_ref());
        Self::update_option(&mut self.publish.gzip, args.gzip.as_ref());
        self.publish.overwrite = args.overwrite;
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration for `command`, collecting every problem.
    pub fn validate(&self, command: &Commands) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        self.publish.validate(&mut diag);
        self.upload.validate(&mut diag);
        if self.publish.engine == Some(StorageKind::S3) {
            self.storage.s3.validate(&mut diag);
        }
        if matches!(command, Commands::Publish { .. }) {
            self.publish.validate_upload(&mut diag);
        }

        diag.print_warnings();
        diag.into_result().map_err(ConfigError::Diagnostics)
    }

    // ========================================================================
    // resolved settings
    // ========================================================================

    pub fn root(&self) -> Result<&Path, ConfigError> {
        self.publish
            .root
            .as_deref()
            .ok_or_else(|| ConfigError::Validation("asset root is not set".into()))
    }

    pub fn engine(&self) -> Result<StorageKind, ConfigError> {
        self.publish
            .engine
            .ok_or_else(|| ConfigError::Validation("storage engine is not set".into()))
    }

    pub fn bucket(&self) -> Result<&str, ConfigError> {
        self.publish
            .bucket
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .ok_or_else(|| ConfigError::Validation("bucket is not set".into()))
    }

    pub fn manifest_path(&self) -> &Path {
        &self.publish.manifest
    }

    /// Configured ledger, or `publishfiles.<engine>.json` inside root.
    pub fn ledger(&self) -> Result<Ledger, ConfigError> {
        match &self.publish.ledger {
            Some(path) => Ok(Ledger::new(path)),
            None => Ok(Ledger::for_engine(self.root()?, self.engine()?)),
        }
    }

    pub fn storage_options(&self) -> StorageOptions {
        StorageOptions {
            timeout: self.upload.timeout(),
            region: self.storage.s3.region.clone(),
            endpoint: self.storage.s3.endpoint.clone(),
        }
    }

    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.publish.minify, self.publish.gzip)
    }

    /// Reconciler wired to this configuration.
    pub fn reconciler(&self) -> Result<Reconciler, ConfigError> {
        Ok(Reconciler::new(self.root()?, self.pipeline())
            .with_prefix(self.publish.prefix.clone())
            .with_filter(self.publish.filter())
            .with_overwrite(self.publish.overwrite)
            .with_retries(self.upload.retries)
            .with_backoff(self.upload.backoff()))
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> StatikConfig {
    let (parsed, ignored) = StatikConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
