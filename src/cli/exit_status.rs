use std::process::ExitCode;

/// Exit status for CLI commands.
///
/// - `Success` (0): Command completed and every unit was processed
/// - `Failure` (1): Command completed but some units could not be read or written
/// - `Error` (2): Command aborted (bad config, unreadable catalog, backup failure, etc.)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    /// Command completed and every unit was processed.
    Success,
    /// Command completed with per-file errors.
    Failure,
    /// Command aborted before completing.
    Error,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::from(0),
            ExitStatus::Failure => ExitCode::from(1),
            ExitStatus::Error => ExitCode::from(2),
        }
    }
}
