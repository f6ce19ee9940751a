//! The rewrite engine.
//!
//! Leaf-first: the lexer and classifier feed the extractor; the matcher
//! filters suggestions; the rewriter turns matched literals into lookups;
//! the catalog store keeps every locale in sync; the session runs it all
//! behind a snapshot.

pub mod catalog;
pub mod classify;
pub mod error;
pub mod extractor;
pub mod file_scanner;
pub mod lexer;
pub mod matcher;
pub mod rewrite;
pub mod session;

pub use catalog::{CatalogDelta, CatalogStore, NewEntry};
pub use classify::{ContextKind, SiteContext, Strategy};
pub use error::{EngineError, EngineResult};
pub use extractor::{Extractor, LiteralSpan, SkipReason};
pub use matcher::{Exclusion, Matcher, Origin, Suggestion};
pub use rewrite::{DeferredSite, FileRewrite, RewriteSite, Rewriter};
pub use session::{
    RestoreSummary, ScanEntry, ScanReport, Session, SessionState, SuggestionSource, Summary,
};
