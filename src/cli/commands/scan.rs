use anyhow::Result;

use super::{CommandResult, CommandSummary, ScanSummary, helper::RunContext};
use crate::{cli::args::ScanCommand, core::Session};

/// List the literals a run would consider, without writing anything.
pub fn scan(cmd: ScanCommand) -> Result<CommandResult> {
    let ctx = RunContext::new(&cmd.common)?;
    ctx.config.validate()?;
    let session = Session::new(&ctx.config, &ctx.project_root);

    let report = session.scan();
    let errors: Vec<String> = report.errors.iter().map(ToString::to_string).collect();

    Ok(CommandResult {
        error_count: errors.len(),
        errors,
        summary: CommandSummary::Scan(ScanSummary {
            entries: report.entries,
            files_scanned: report.files_scanned,
        }),
    })
}
