//! statik - incremental publishing of static asset builds.

mod cli;
mod config;
mod core;
mod ledger;
mod logger;
mod manifest;
mod pipeline;
mod reconcile;
mod storage;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::StatikConfig;
use logger::Verbosity;

fn main() {
    if let Err(e) = run() {
        error!("error"; "{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose));

    let config = StatikConfig::load(&cli)?;

    match &cli.command {
        Commands::Publish { .. } => cli::publish::publish(&config),
        Commands::Plan { .. } => cli::plan::plan(&config),
        Commands::Reset => cli::reset::reset(&config),
    }
}
