use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use super::{CommandResult, CommandSummary};
use crate::{
    cli::args::{CommonArgs, RunArgs},
    config::{CONFIG_FILE_NAME, Config, load_config},
    core::{EngineError, Session, SuggestionSource, Summary},
};

/// Merged configuration and the directory paths are resolved against.
pub struct RunContext {
    /// Merged configuration (CLI args > config file > defaults).
    pub config: Config,
    pub project_root: PathBuf,
}

impl RunContext {
    /// Load the config found from `--root` and apply the common overrides.
    pub fn new(common: &CommonArgs) -> Result<Self> {
        let root = common
            .root
            .canonicalize()
            .with_context(|| format!("Invalid project root: {}", common.root.display()))?;
        if !root.is_dir() {
            bail!("Project root is not a directory: {}", root.display());
        }

        let loaded = load_config(&root)?;
        if loaded.from_file {
            debug!(root = %loaded.project_root.display(), "loaded {}", CONFIG_FILE_NAME);
        } else {
            info!("no {} found, using default configuration", CONFIG_FILE_NAME);
        }

        let mut config = loaded.config;
        if let Some(source_root) = &common.source_root {
            config.source_root = source_root.clone();
        }
        if let Some(l10n_dir) = &common.l10n_dir {
            config.l10n_dir = l10n_dir.clone();
        }
        if let Some(locale) = &common.reference_locale {
            config.reference_locale = locale.clone();
        }

        Ok(Self {
            config,
            project_root: loaded.project_root,
        })
    }

    /// Apply the run flags on top of the loaded config.
    pub fn with_run_args(mut self, args: &RunArgs) -> Result<Self> {
        if let Some(confidence) = args.confidence {
            self.config.min_confidence = confidence;
        }
        if let Some(max_changes) = args.max_changes {
            self.config.max_changes = max_changes;
        }
        self.config.validate()?;
        Ok(self)
    }
}

/// Run a session, or restore the last snapshot when `--restore` is given.
pub fn execute(
    ctx: &RunContext,
    args: &RunArgs,
    source: SuggestionSource,
) -> Result<CommandResult> {
    let mut session = Session::new(&ctx.config, &ctx.project_root);

    if args.restore {
        let restored = session.restore()?;
        return Ok(CommandResult {
            summary: CommandSummary::Restore(restored),
            error_count: 0,
            errors: Vec::new(),
        });
    }

    let summary = session.run(&source, args.dry_run)?;
    Ok(finish_run(summary))
}

fn finish_run(summary: Summary) -> CommandResult {
    let errors: Vec<String> = summary
        .file_errors
        .iter()
        .map(EngineError::to_string)
        .collect();
    CommandResult {
        error_count: errors.len(),
        errors,
        summary: CommandSummary::Run(summary),
    }
}
