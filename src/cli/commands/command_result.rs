use super::super::exit_status::ExitStatus;
use crate::core::{RestoreSummary, ScanEntry, Summary};

#[derive(Debug)]
pub struct ScanSummary {
    pub entries: Vec<ScanEntry>,
    pub files_scanned: usize,
}

#[derive(Debug)]
pub struct InitSummary {
    pub created: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
pub enum CommandSummary {
    Run(Summary),
    Restore(RestoreSummary),
    Scan(ScanSummary),
    Init(InitSummary),
}

/// Result of running an arbify command.
#[derive(Debug)]
pub struct CommandResult {
    pub summary: CommandSummary,
    /// Per-file errors and other non-fatal failures.
    pub error_count: usize,
    /// Rendered non-fatal errors, in the order they occurred.
    pub errors: Vec<String>,
}

impl CommandResult {
    pub fn exit_status(&self) -> ExitStatus {
        if self.error_count > 0 {
            ExitStatus::Failure
        } else {
            ExitStatus::Success
        }
    }
}
