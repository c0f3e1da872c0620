//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::storage::StorageKind;

/// Publish changed static assets to a storage backend
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: statik.toml, searched upward)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Directory holding the built assets and the manifest
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Storage engine: local (filesystem) or s3 (object-store)
    #[arg(short, long, global = true)]
    pub engine: Option<StorageKind>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Upload assets changed since the last publish
    #[command(visible_alias = "p")]
    Publish {
        #[command(flatten)]
        args: PublishArgs,
    },

    /// Show what publish would upload, without uploading or saving anything
    #[command(visible_alias = "n")]
    Plan {
        #[command(flatten)]
        args: PublishArgs,
    },

    /// Forget every published file for the selected engine
    Reset,
}

/// Shared arguments for Publish and Plan
#[derive(clap::Args, Debug, Clone, Default)]
pub struct PublishArgs {
    /// Bucket name, or destination directory for the local engine
    #[arg(short, long)]
    pub bucket: Option<String>,

    /// Directory prefix for uploaded keys
    #[arg(short, long)]
    pub directory: Option<String>,

    /// Minify scripts and stylesheets before upload
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,

    /// Gzip compressible files before upload
    #[arg(short = 'z', long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub gzip: Option<bool>,

    /// Ignore previously published files and upload everything
    #[arg(short, long)]
    pub overwrite: bool,

    /// Only upload changed files matching this glob (e.g. "*.css")
    #[arg(short, long)]
    pub pattern: Option<String>,
}
