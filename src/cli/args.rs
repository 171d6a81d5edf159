//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Keep only the modules you touch in your build graph
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path, searched upward from the project root
    #[arg(short = 'C', long, global = true, default_value = "dormant.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Project root (default: config file directory, or current directory)
    #[arg(long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Track activity and keep the manifest in sync until Ctrl+C
    #[command(visible_alias = "w")]
    Watch {
        /// Also read `open <path>` / `close <path>` lines from stdin
        #[arg(long)]
        stdin: bool,

        /// Minutes without activity before a module is released
        #[arg(short = 't', long)]
        idle_timeout: Option<u64>,

        /// Force auto sleep on or off, ignoring the module count
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        auto_sleep: Option<bool>,

        /// Leave the manifest as is on exit instead of restoring it
        #[arg(short, long)]
        keep: bool,
    },

    /// Include the given modules (and their dependencies) now
    #[command(visible_alias = "a")]
    Apply {
        /// Module paths (`:lib:foo`) or directories
        #[arg(required = true, value_name = "MODULE|DIR")]
        targets: Vec<String>,
    },

    /// Remove all managed state from the manifest
    #[command(visible_alias = "r")]
    Restore,

    /// Print the dependency closure of a module
    #[command(visible_alias = "d")]
    Deps {
        /// Module path (`:lib:foo`) or directory
        #[arg(value_name = "MODULE|DIR")]
        target: String,

        /// Output JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show discovered modules and manifest state
    #[command(visible_alias = "s")]
    Status {
        /// Output JSON
        #[arg(short, long)]
        json: bool,

        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_watch() {
        let cli = Cli::parse_from(["dormant", "watch", "--stdin", "-t", "5", "--auto-sleep"]);
        match cli.command {
            Commands::Watch {
                stdin,
                idle_timeout,
                auto_sleep,
                keep,
            } => {
                assert!(stdin);
                assert_eq!(idle_timeout, Some(5));
                assert_eq!(auto_sleep, Some(true));
                assert!(!keep);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["dormant", "status", "--json", "-v", "--root", "repo"]);
        assert!(cli.verbose);
        assert_eq!(cli.root, Some(PathBuf::from("repo")));
        assert_eq!(cli.config, PathBuf::from("dormant.toml"));
        assert!(matches!(cli.command, Commands::Status { json: true, pretty: false }));
    }

    #[test]
    fn test_apply_requires_targets() {
        assert!(Cli::try_parse_from(["dormant", "apply"]).is_err());
        let cli = Cli::parse_from(["dormant", "apply", ":lib:a", "lib/b"]);
        assert!(matches!(cli.command, Commands::Apply { ref targets } if targets.len() == 2));
    }
}
