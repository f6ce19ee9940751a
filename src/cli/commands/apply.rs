use anyhow::Result;

use super::{
    CommandResult,
    helper::{RunContext, execute},
};
use crate::{cli::args::ApplyCommand, core::SuggestionSource, utils::resolve_path};

/// Rewrite the literals named by the suggestion document.
pub fn apply(cmd: ApplyCommand) -> Result<CommandResult> {
    let ctx = RunContext::new(&cmd.args.common)?.with_run_args(&cmd.args)?;
    let path = match cmd.suggestions {
        Some(path) => path,
        None => resolve_path(&ctx.project_root, &ctx.config.suggestions_file),
    };
    execute(&ctx, &cmd.args, SuggestionSource::Document(path))
}
