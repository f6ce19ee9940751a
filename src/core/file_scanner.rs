use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use glob::{Pattern, glob};
use tracing::warn;
use walkdir::WalkDir;

/// Check if a pattern contains glob wildcards (* or ?).
/// Patterns without wildcards are treated as literal directory paths.
fn is_glob_pattern(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Result of scanning files.
pub struct ScanResult {
    /// Dart source files, sorted so every run visits them in the same order.
    pub files: Vec<PathBuf>,
    pub skipped_count: usize,
}

/// Enumerate Dart source units under `base_dir`.
///
/// `includes` narrows the walk to sub-directories (literal paths or globs,
/// relative to `base_dir`); `ignore_patterns` drops matches by glob or by
/// literal path prefix; `excluded_dirs` are absolute prefixes that are never
/// scanned (the catalog directory, the backup directory).
pub fn scan_files(
    base_dir: &Path,
    includes: &[String],
    ignore_patterns: &[String],
    excluded_dirs: &[PathBuf],
) -> ScanResult {
    let mut files: BTreeSet<PathBuf> = BTreeSet::new();
    let mut skipped_count = 0;

    let mut literal_ignore_paths: Vec<PathBuf> = excluded_dirs.to_vec();
    let mut glob_patterns: Vec<Pattern> = Vec::new();

    for p in ignore_patterns {
        if is_glob_pattern(p) {
            match Pattern::new(p) {
                Ok(pattern) => glob_patterns.push(pattern),
                Err(e) => warn!(pattern = %p, error = %e, "invalid ignore pattern"),
            }
        } else {
            literal_ignore_paths.push(base_dir.join(p));
        }
    }

    let dirs_to_scan: Vec<PathBuf> = if includes.is_empty() {
        vec![base_dir.to_path_buf()]
    } else {
        let mut paths = Vec::new();
        for inc in includes {
            if is_glob_pattern(inc) {
                let full_pattern = base_dir.join(inc);
                let pattern_str = full_pattern.to_string_lossy();
                match glob(&pattern_str) {
                    Ok(entries) => {
                        for entry in entries.flatten() {
                            if entry.is_dir() {
                                paths.push(entry);
                            }
                        }
                    }
                    Err(e) => warn!(pattern = %inc, error = %e, "invalid include pattern"),
                }
            } else {
                let path = base_dir.join(inc);
                if path.exists() {
                    paths.push(path);
                } else {
                    warn!(path = %path.display(), "include path does not exist");
                }
            }
        }
        paths
    };

    for dir in dirs_to_scan {
        for entry in WalkDir::new(dir) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    skipped_count += 1;
                    warn!(error = %e, "cannot access path");
                    continue;
                }
            };
            let path = entry.path();
            let path_str = path.to_string_lossy();

            if literal_ignore_paths
                .iter()
                .any(|ignore_path| path.starts_with(ignore_path))
            {
                continue;
            }

            if glob_patterns.iter().any(|p| p.matches(&path_str)) {
                continue;
            }

            if path.is_file() && is_dart_file(path) {
                files.insert(path.to_path_buf());
            }
        }
    }

    ScanResult {
        files: files.into_iter().collect(),
        skipped_count,
    }
}

fn is_dart_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("dart")
}

#[cfg(test)]
mod tests {
    use std::fs::{self, File};

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_scan_dart_files_sorted() {
        let dir = tempdir().unwrap();
        let dir_path = dir.path();

        File::create(dir_path.join("main.dart")).unwrap();
        File::create(dir_path.join("app.dart")).unwrap();
        File::create(dir_path.join("pubspec.yaml")).unwrap();

        let result = scan_files(dir_path, &[], &[], &[]);

        assert_eq!(
            result.files,
            vec![dir_path.join("app.dart"), dir_path.join("main.dart")]
        );
    }

    #[test]
    fn test_scan_ignores_generated_files() {
        let dir = tempdir().unwrap();
        let dir_path = dir.path();

        File::create(dir_path.join("model.dart")).unwrap();
        File::create(dir_path.join("model.g.dart")).unwrap();
        File::create(dir_path.join("model.freezed.dart")).unwrap();

        let ignores = vec!["**/*.g.dart".to_string(), "**/*.freezed.dart".to_string()];
        let result = scan_files(dir_path, &[], &ignores, &[]);

        assert_eq!(result.files, vec![dir_path.join("model.dart")]);
    }

    #[test]
    fn test_scan_excluded_dirs() {
        let dir = tempdir().unwrap();
        let dir_path = dir.path();

        let l10n = dir_path.join("l10n");
        fs::create_dir(&l10n).unwrap();
        File::create(l10n.join("app_localizations.dart")).unwrap();
        File::create(dir_path.join("main.dart")).unwrap();

        let result = scan_files(dir_path, &[], &[], &[l10n]);

        assert_eq!(result.files, vec![dir_path.join("main.dart")]);
    }

    #[test]
    fn test_scan_with_includes() {
        let dir = tempdir().unwrap();
        let dir_path = dir.path();

        let widgets = dir_path.join("widgets");
        fs::create_dir(&widgets).unwrap();
        File::create(widgets.join("button.dart")).unwrap();

        let services = dir_path.join("services");
        fs::create_dir(&services).unwrap();
        File::create(services.join("api.dart")).unwrap();

        let result = scan_files(dir_path, &["widgets".to_string()], &[], &[]);

        assert_eq!(result.files, vec![widgets.join("button.dart")]);
    }

    #[test]
    fn test_is_dart_file() {
        assert!(is_dart_file(Path::new("main.dart")));
        assert!(!is_dart_file(Path::new("app_en.arb")));
        assert!(!is_dart_file(Path::new("README.md")));
    }
}
