//! Error kinds raised by the rewrite engine.
//!
//! Fatal kinds stop a run before anything in the source tree is mutated.
//! `FileIo` is the only per-file kind; the session records it in the summary
//! and moves on to the next unit.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A catalog document exists but is not a JSON object.
    #[error("failed to read catalog {}: {reason}", path.display())]
    CatalogRead { path: PathBuf, reason: String },

    /// A catalog document could not be written back.
    #[error("failed to write catalog {}: {source}", path.display())]
    CatalogWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The suggestion document is missing or malformed.
    #[error("failed to read suggestions {}: {reason}", path.display())]
    SuggestionRead { path: PathBuf, reason: String },

    /// The snapshot of the source tree could not be completed.
    #[error("failed to create backup at {}: {source}", path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No usable backup exists, or copying it back failed.
    #[error("cannot restore from {}: {reason}", path.display())]
    Restore { path: PathBuf, reason: String },

    /// A single source unit could not be read or written.
    #[error("{}: {source}", path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EngineError {
    /// Whether the error aborts the whole run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, EngineError::FileIo { .. })
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_io_is_not_fatal() {
        let err = EngineError::FileIo {
            path: PathBuf::from("lib/main.dart"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "lib/main.dart: denied");
    }

    #[test]
    fn test_catalog_read_is_fatal() {
        let err = EngineError::CatalogRead {
            path: PathBuf::from("lib/l10n/app_en.arb"),
            reason: "expected value at line 1 column 1".to_string(),
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("app_en.arb"));
    }
}
