//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `apply`: Rewrite literals named by a suggestion document
//! - `match`: Rewrite literals whose text already exists in the reference catalog
//! - `scan`: List candidate literals without changing anything
//! - `init`: Create a default `.arbifyrc.json`
//!
//! `apply` and `match` share the run flags, including `--restore`, which
//! rolls back the last run instead of starting a new one.

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }

    /// Get the verbose flag from the command's common args.
    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Apply(cmd)) => cmd.args.common.verbose,
            Some(Command::Match(cmd)) => cmd.args.common.verbose,
            Some(Command::Scan(cmd)) => cmd.common.verbose,
            Some(Command::Init) | None => false,
        }
    }
}

/// Common arguments shared by all commands.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Project root: where the config file is searched from and paths are resolved against
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Dart source root directory (overrides config file)
    #[arg(long)]
    pub source_root: Option<String>,

    /// ARB catalog directory (overrides config file)
    #[arg(long)]
    pub l10n_dir: Option<String>,

    /// Reference locale (overrides config file)
    #[arg(long)]
    pub reference_locale: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Flags of the mutating commands.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Minimum suggestion confidence, 0.0 to 1.0 (overrides config file)
    #[arg(long)]
    pub confidence: Option<f64>,

    /// Maximum number of suggestions applied in one run (overrides config file)
    #[arg(long)]
    pub max_changes: Option<usize>,

    /// Report what would change without writing anything
    #[arg(long, conflicts_with = "restore")]
    pub dry_run: bool,

    /// Restore the source tree from the last backup instead of running
    #[arg(long)]
    pub restore: bool,
}

#[derive(Debug, Args)]
pub struct ApplyCommand {
    #[command(flatten)]
    pub args: RunArgs,

    /// Suggestion document (overrides config file)
    #[arg(long)]
    pub suggestions: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct MatchCommand {
    #[command(flatten)]
    pub args: RunArgs,

    /// Process at most this many source files
    #[arg(long)]
    pub max_files: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ScanCommand {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply localization suggestions from a suggestion document
    Apply(ApplyCommand),
    /// Replace literals whose text matches an existing reference catalog entry
    Match(MatchCommand),
    /// List candidate literals for review
    Scan(ScanCommand),
    /// Initialize a new .arbifyrc.json configuration file
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_apply_flags() {
        let args = Arguments::try_parse_from([
            "arbify",
            "apply",
            "--root",
            "app",
            "--confidence",
            "0.9",
            "--max-changes",
            "10",
            "--dry-run",
            "-v",
        ])
        .unwrap();
        let Some(Command::Apply(cmd)) = &args.command else {
            panic!("expected apply");
        };
        assert_eq!(cmd.args.common.root, PathBuf::from("app"));
        assert_eq!(cmd.args.confidence, Some(0.9));
        assert_eq!(cmd.args.max_changes, Some(10));
        assert!(cmd.args.dry_run);
        assert!(args.verbose());
    }

    #[test]
    fn test_dry_run_conflicts_with_restore() {
        let result = Arguments::try_parse_from(["arbify", "match", "--dry-run", "--restore"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Arguments::command().debug_assert();
    }
}
