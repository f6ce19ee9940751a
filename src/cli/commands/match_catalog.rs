use anyhow::Result;

use super::{
    CommandResult,
    helper::{RunContext, execute},
};
use crate::{cli::args::MatchCommand, core::SuggestionSource};

/// Rewrite literals whose text is already a reference catalog entry.
pub fn match_catalog(cmd: MatchCommand) -> Result<CommandResult> {
    let ctx = RunContext::new(&cmd.args.common)?.with_run_args(&cmd.args)?;
    let source = SuggestionSource::Catalog {
        max_files: cmd.max_files,
    };
    execute(&ctx, &cmd.args, source)
}
