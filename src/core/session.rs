//! The Apply/Rollback Session.
//!
//! One run: load catalogs and suggestions, filter, take a snapshot, rewrite
//! every source unit, update the catalogs once, and return a [`Summary`].
//! Anything that would leave the tree unrecoverable fails before the first
//! write; errors confined to one unit are recorded and the run continues.

use std::{
    collections::{BTreeSet, HashSet},
    fs, io,
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::{
    config::Config,
    core::{
        catalog::{CatalogStore, NewEntry},
        error::{EngineError, EngineResult},
        extractor::{Extractor, LiteralSpan},
        file_scanner::scan_files,
        matcher::{CatalogIndex, Exclusion, Matcher, Suggestion, load_suggestions},
        rewrite::{DeferredSite, Rewriter, line_text, match_sites},
    },
    utils::{relative_slash_path, resolve_path, write_atomic},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Snapshotting,
    Processing,
    Summarizing,
    Restoring,
}

/// Where a run's suggestions come from.
#[derive(Debug, Clone)]
pub enum SuggestionSource {
    /// A suggestion document written by an analysis pass.
    Document(PathBuf),
    /// Literals matched directly against the reference catalog's texts.
    Catalog { max_files: Option<usize> },
}

/// Resolved locations of everything a session touches.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub project_root: PathBuf,
    pub source_root: PathBuf,
    pub l10n_dir: PathBuf,
    pub backup_dir: PathBuf,
}

impl ProjectPaths {
    pub fn from_config(config: &Config, project_root: &Path) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            source_root: resolve_path(project_root, &config.source_root),
            l10n_dir: resolve_path(project_root, &config.l10n_dir),
            backup_dir: resolve_path(project_root, &config.backup_dir),
        }
    }

    /// Directories captured by the snapshot: the source root, plus the
    /// catalog directory when it lies outside it.
    pub fn snapshot_roots(&self) -> Vec<PathBuf> {
        let mut roots = vec![self.source_root.clone()];
        if !self.l10n_dir.starts_with(&self.source_root) {
            roots.push(self.l10n_dir.clone());
        }
        roots
    }

    /// Where a snapshot root is kept inside the backup directory.
    fn backup_of(&self, root: &Path) -> PathBuf {
        self.backup_dir
            .join(relative_slash_path(root, &self.project_root))
    }

    fn unit_path(&self, unit: &Path) -> String {
        relative_slash_path(unit, &self.project_root)
    }

    /// Directories between the source root and the unit.
    fn depth(&self, unit: &Path) -> usize {
        unit.strip_prefix(&self.source_root)
            .map(|rel| rel.components().count().saturating_sub(1))
            .unwrap_or(0)
    }
}

/// Per-unit outcome.
#[derive(Debug, Clone)]
pub struct FileReport {
    /// Project-relative path with forward slashes.
    pub path: String,
    pub rewritten: usize,
    pub const_dropped: usize,
    pub import_added: bool,
    pub deferred: Vec<DeferredSite>,
}

/// Outcome of a completed run.
#[derive(Debug, Default)]
pub struct Summary {
    pub dry_run: bool,
    pub files_scanned: usize,
    pub files_touched: usize,
    pub literals_rewritten: usize,
    pub const_dropped: usize,
    pub imports_added: usize,
    pub keys_added: usize,
    pub placeholders_added: usize,
    pub suggestions_total: usize,
    pub suggestions_accepted: usize,
    pub excluded: Vec<(Suggestion, Exclusion)>,
    /// Accepted suggestions beyond the change cap.
    pub truncated: usize,
    /// Accepted suggestions whose text was not found in any unit.
    pub unmatched: Vec<Suggestion>,
    pub files: Vec<FileReport>,
    /// Per-unit I/O failures; the run continued past each.
    pub file_errors: Vec<EngineError>,
    pub backup: Option<PathBuf>,
}

impl Summary {
    pub fn deferred_count(&self) -> usize {
        self.files.iter().map(|f| f.deferred.len()).sum()
    }
}

/// Outcome of a restore.
#[derive(Debug)]
pub struct RestoreSummary {
    pub restored: Vec<PathBuf>,
    pub backup: PathBuf,
}

/// Everything `scan` found.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub entries: Vec<ScanEntry>,
    /// Units walked, whether or not they hold a candidate.
    pub files_scanned: usize,
    pub errors: Vec<EngineError>,
}

/// A reviewable literal from `scan`.
#[derive(Debug, Clone)]
pub struct ScanEntry {
    pub path: String,
    pub literal: LiteralSpan,
    pub source_line: String,
}

pub struct Session<'c> {
    config: &'c Config,
    paths: ProjectPaths,
    state: SessionState,
}

impl<'c> Session<'c> {
    pub fn new(config: &'c Config, project_root: &Path) -> Self {
        Self {
            config,
            paths: ProjectPaths::from_config(config, project_root),
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    fn rewriter(&self) -> Rewriter<'c> {
        let config = self.config;
        Rewriter {
            lookup_class: &config.lookup_class,
            import_path: &config.import_path,
            defer_marker: config
                .annotate_deferred
                .then_some(config.defer_marker.as_str()),
            drop_const: config.drop_const,
        }
    }

    /// Dart units to process, sorted.
    fn units(&self) -> Vec<PathBuf> {
        let excluded = [self.paths.l10n_dir.clone(), self.paths.backup_dir.clone()];
        let result = scan_files(
            &self.paths.source_root,
            &self.config.includes,
            &self.config.ignores,
            &excluded,
        );
        if result.skipped_count > 0 {
            warn!(
                count = result.skipped_count,
                "paths skipped due to access errors"
            );
        }
        result.files
    }

    /// Run the whole pipeline. Nothing is written when `dry_run` is set.
    pub fn run(&mut self, source: &SuggestionSource, dry_run: bool) -> EngineResult<Summary> {
        let result = self.run_inner(source, dry_run);
        self.state = SessionState::Idle;
        result
    }

    fn run_inner(&mut self, source: &SuggestionSource, dry_run: bool) -> EngineResult<Summary> {
        let mut summary = Summary {
            dry_run,
            ..Summary::default()
        };

        // Everything that can fail fatally is read before the snapshot.
        let mut catalogs = CatalogStore::open(&self.paths.l10n_dir, self.config)?;
        let mut units = self.units();

        let suggestions = match source {
            SuggestionSource::Document(path) => load_suggestions(path)?,
            SuggestionSource::Catalog { max_files } => {
                if let Some(max) = max_files {
                    units.truncate(*max);
                }
                self.catalog_suggestions(&catalogs, &units, &mut summary.file_errors)
            }
        };
        summary.suggestions_total = suggestions.len();

        let matcher = Matcher::new(self.config.min_confidence, self.config.max_changes);
        let reference_keys = catalogs.keys(catalogs.reference_locale());
        let outcome = matcher.filter(suggestions, &reference_keys);
        summary.suggestions_accepted = outcome.accepted.len();
        summary.excluded = outcome.excluded;
        summary.truncated = outcome.truncated;
        let accepted = outcome.accepted;

        if !dry_run {
            self.state = SessionState::Snapshotting;
            self.snapshot()?;
            summary.backup = Some(self.paths.backup_dir.clone());
        }

        self.state = SessionState::Processing;
        let rewriter = self.rewriter();
        let mut applied: BTreeSet<String> = BTreeSet::new();
        let mut matched: HashSet<(String, String)> = HashSet::new();
        let failed: HashSet<PathBuf> = summary
            .file_errors
            .iter()
            .filter_map(|e| match e {
                EngineError::FileIo { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect();

        for unit in &units {
            summary.files_scanned += 1;
            if failed.contains(unit) {
                continue;
            }
            let unit_path = self.paths.unit_path(unit);
            let unit_suggestions: Vec<&Suggestion> = accepted
                .iter()
                .filter(|s| s.mentions_unit(&unit_path))
                .collect();
            if unit_suggestions.is_empty() {
                continue;
            }

            let content = match fs::read_to_string(unit) {
                Ok(content) => content,
                Err(source) => {
                    warn!(path = %unit.display(), error = %source, "cannot read unit");
                    summary.file_errors.push(EngineError::FileIo {
                        path: unit.clone(),
                        source,
                    });
                    continue;
                }
            };

            let extractor = Extractor::new(&content, &self.config.lookup_class);
            let sites = match_sites(extractor.literals(), &unit_suggestions);
            for site in &sites {
                matched.insert((site.key.clone(), site.literal.value.clone()));
            }
            if sites.is_empty() {
                continue;
            }

            let rewrite = rewriter.rewrite(&content, &sites, self.paths.depth(unit));
            if rewrite.is_modified(&content) {
                if !dry_run {
                    if let Err(source) = write_atomic(unit, &rewrite.content) {
                        warn!(path = %unit.display(), error = %source, "cannot write unit");
                        summary.file_errors.push(EngineError::FileIo {
                            path: unit.clone(),
                            source,
                        });
                        continue;
                    }
                }
                summary.files_touched += 1;
            }

            info!(
                path = %unit_path,
                rewritten = rewrite.changed,
                deferred = rewrite.deferred.len(),
                "processed unit"
            );
            summary.literals_rewritten += rewrite.changed;
            summary.const_dropped += rewrite.const_dropped;
            summary.imports_added += usize::from(rewrite.import_added);
            applied.extend(rewrite.applied_keys);
            summary.files.push(FileReport {
                path: unit_path,
                rewritten: rewrite.changed,
                const_dropped: rewrite.const_dropped,
                import_added: rewrite.import_added,
                deferred: rewrite.deferred,
            });
        }

        // Only keys that now appear in source; deferred sites get no entry.
        let mut seen = HashSet::new();
        let entries: Vec<NewEntry> = accepted
            .iter()
            .filter(|s| applied.contains(&s.key) && seen.insert(s.key.clone()))
            .map(|s| NewEntry {
                key: s.key.clone(),
                text: s.value.clone(),
                context: s.context.clone(),
            })
            .collect();
        let delta = catalogs.update(&entries, !dry_run)?;
        summary.keys_added = delta.keys_added;
        summary.placeholders_added = delta.placeholders_added;

        self.state = SessionState::Summarizing;
        summary.unmatched = accepted
            .into_iter()
            .filter(|s| !matched.contains(&(s.key.clone(), s.value.clone())))
            .collect();
        info!(
            files_touched = summary.files_touched,
            rewritten = summary.literals_rewritten,
            keys_added = summary.keys_added,
            deferred = summary.deferred_count(),
            "run complete"
        );
        Ok(summary)
    }

    /// One suggestion per distinct (unit, text) whose text is a reference
    /// catalog value.
    fn catalog_suggestions(
        &self,
        catalogs: &CatalogStore,
        units: &[PathBuf],
        errors: &mut Vec<EngineError>,
    ) -> Vec<Suggestion> {
        let index = CatalogIndex::new(catalogs.reference().entries());
        debug!(texts = index.len(), "indexed reference catalog");
        let mut suggestions = Vec::new();
        if index.is_empty() {
            return suggestions;
        }

        for unit in units {
            let content = match fs::read_to_string(unit) {
                Ok(content) => content,
                Err(source) => {
                    warn!(path = %unit.display(), error = %source, "cannot read unit");
                    errors.push(EngineError::FileIo {
                        path: unit.clone(),
                        source,
                    });
                    continue;
                }
            };
            let unit_path = self.paths.unit_path(unit);
            let mut seen = HashSet::new();
            let extractor = Extractor::new(&content, &self.config.lookup_class);
            for literal in extractor.candidates() {
                if !seen.insert(literal.value.clone()) {
                    continue;
                }
                if let Some(suggestion) = index.suggest(&literal.value, &unit_path) {
                    suggestions.push(suggestion);
                }
            }
        }
        suggestions
    }

    /// Copy the mutable tree into a fresh backup directory.
    fn snapshot(&self) -> EngineResult<()> {
        let backup = &self.paths.backup_dir;
        let backup_error = |source: io::Error| EngineError::Backup {
            path: backup.clone(),
            source,
        };

        let roots = self.paths.snapshot_roots();
        if roots.iter().any(|root| backup.starts_with(root)) {
            return Err(backup_error(io::Error::new(
                io::ErrorKind::InvalidInput,
                "backup directory lies inside the tree it would copy",
            )));
        }

        if backup.exists() {
            fs::remove_dir_all(backup).map_err(backup_error)?;
        }
        fs::create_dir_all(backup).map_err(backup_error)?;
        for root in &roots {
            if root.exists() {
                copy_tree(root, &self.paths.backup_of(root)).map_err(backup_error)?;
            }
        }
        info!(path = %backup.display(), "created backup");
        Ok(())
    }

    /// Replace the mutable tree with the last snapshot.
    pub fn restore(&mut self) -> EngineResult<RestoreSummary> {
        self.state = SessionState::Restoring;
        let result = self.restore_inner();
        self.state = SessionState::Idle;
        result
    }

    fn restore_inner(&self) -> EngineResult<RestoreSummary> {
        let backup = &self.paths.backup_dir;
        let restore_error = |reason: String| EngineError::Restore {
            path: backup.clone(),
            reason,
        };

        let roots = self.paths.snapshot_roots();
        for root in &roots {
            if !self.paths.backup_of(root).is_dir() {
                return Err(restore_error(format!(
                    "no backup of {}",
                    relative_slash_path(root, &self.paths.project_root)
                )));
            }
        }

        let mut restored = Vec::new();
        for root in roots {
            let saved = self.paths.backup_of(&root);
            if root.exists() {
                fs::remove_dir_all(&root).map_err(|e| restore_error(e.to_string()))?;
            }
            copy_tree(&saved, &root).map_err(|e| restore_error(e.to_string()))?;
            info!(path = %root.display(), "restored");
            restored.push(root);
        }
        Ok(RestoreSummary {
            restored,
            backup: backup.clone(),
        })
    }

    /// Every extractor candidate in the tree, without touching anything.
    pub fn scan(&self) -> ScanReport {
        let mut report = ScanReport::default();
        for unit in self.units() {
            report.files_scanned += 1;
            let content = match fs::read_to_string(&unit) {
                Ok(content) => content,
                Err(source) => {
                    report.errors.push(EngineError::FileIo { path: unit, source });
                    continue;
                }
            };
            let path = self.paths.unit_path(&unit);
            let extractor = Extractor::new(&content, &self.config.lookup_class);
            for literal in extractor.candidates() {
                report.entries.push(ScanEntry {
                    path: path.clone(),
                    source_line: line_text(&content, literal.range.start).to_string(),
                    literal,
                });
            }
        }
        report
    }
}

/// Recursively copy `from` into `to`, creating `to`.
fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(from)
            .map_err(io::Error::other)?;
        let target = to.join(rel);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target)?;
        } else {
            debug!(path = %entry.path().display(), "skipping non-regular file");
        }
    }
    Ok(())
}
