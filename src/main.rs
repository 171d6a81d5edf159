//! Dormant - keep idle modules out of a large multi-module build.

mod actor;
mod cli;
mod config;
mod host;
mod logger;
mod manifest;
mod module;
mod reconcile;
mod resolver;
mod utils;
mod workspace;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::WorkspaceConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = WorkspaceConfig::load(&cli)?;

    match &cli.command {
        Commands::Watch { stdin, .. } => cli::watch::run_watch(config, *stdin),
        Commands::Apply { targets } => cli::apply::run_apply(config, targets),
        Commands::Restore => cli::restore::run_restore(config),
        Commands::Deps { target, json } => cli::deps::run_deps(config, target, *json),
        Commands::Status { json, pretty } => cli::status::run_status(config, *json, *pretty),
    }
}
