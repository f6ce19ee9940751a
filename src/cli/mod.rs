use std::path::Path;

use anyhow::Result;

pub mod args;
mod commands;
pub mod exit_status;
mod logging;
mod report;

pub use args::{Arguments, Command};
pub use exit_status::ExitStatus;

use commands::{apply::apply, init::init, match_catalog::match_catalog, scan::scan};

pub fn run_cli(args: Arguments) -> Result<ExitStatus> {
    let verbose = args.verbose();
    logging::init_tracing(verbose);

    let Some(args) = args.with_command_or_help() else {
        return Ok(ExitStatus::Success);
    };

    let result = match args.command {
        Some(Command::Apply(cmd)) => apply(cmd)?,
        Some(Command::Match(cmd)) => match_catalog(cmd)?,
        Some(Command::Scan(cmd)) => scan(cmd)?,
        Some(Command::Init) => init(Path::new("."))?,
        None => return Ok(ExitStatus::Success),
    };
    report::print(&result, verbose);

    Ok(result.exit_status())
}
