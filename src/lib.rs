//! Arbify - move hardcoded Flutter UI strings into ARB catalogs
//!
//! Arbify is a CLI tool and library that rewrites string literals in a Dart
//! source tree into `AppLocalizations` lookups with the original literal as
//! fallback, adds the keys to every locale's ARB catalog, and keeps a snapshot
//! so a run can be rolled back.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer (arguments, commands, reporting)
//! - `config`: Configuration file loading and parsing
//! - `core`: Rewrite engine (extraction, matching, rewriting, catalogs, sessions)
//! - `utils`: Shared utility functions

pub mod cli;
pub mod config;
pub mod core;
pub mod utils;
