use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Ok, Result, bail};
use glob::Pattern;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = ".arbifyrc.json";

/// Placeholder substituted with the locale tag in `catalogPattern`.
pub const LOCALE_PLACEHOLDER: &str = "{locale}";

pub const GENERATED_FILE_PATTERNS: &[&str] = &["**/*.g.dart", "**/*.freezed.dart"];

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_source_root")]
    pub source_root: String,
    #[serde(default = "default_l10n_dir", alias = "arbDir")]
    pub l10n_dir: String,
    #[serde(default = "default_catalog_pattern")]
    pub catalog_pattern: String,
    #[serde(default = "default_reference_locale")]
    pub reference_locale: String,
    #[serde(default)]
    pub locales: Vec<String>,
    #[serde(default = "default_suggestions_file")]
    pub suggestions_file: String,
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,
    #[serde(default = "default_lookup_class")]
    pub lookup_class: String,
    #[serde(default = "default_import_path")]
    pub import_path: String,
    #[serde(default = "default_defer_marker")]
    pub defer_marker: String,
    #[serde(default = "default_true")]
    pub annotate_deferred: bool,
    #[serde(default = "default_true")]
    pub drop_const: bool,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    #[serde(default = "default_max_changes")]
    pub max_changes: usize,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default = "default_ignores")]
    pub ignores: Vec<String>,
}

fn default_source_root() -> String {
    "lib".to_string()
}

fn default_l10n_dir() -> String {
    "lib/l10n".to_string()
}

fn default_catalog_pattern() -> String {
    format!("app_{}.arb", LOCALE_PLACEHOLDER)
}

fn default_reference_locale() -> String {
    "en".to_string()
}

fn default_suggestions_file() -> String {
    "strings_to_localize.json".to_string()
}

fn default_backup_dir() -> String {
    "backup_before_localization".to_string()
}

fn default_lookup_class() -> String {
    "AppLocalizations".to_string()
}

fn default_import_path() -> String {
    "l10n/app_localizations.dart".to_string()
}

fn default_defer_marker() -> String {
    "TODO(l10n)".to_string()
}

fn default_true() -> bool {
    true
}

pub fn default_min_confidence() -> f64 {
    0.8
}

pub fn default_max_changes() -> usize {
    50
}

fn default_ignores() -> Vec<String> {
    GENERATED_FILE_PATTERNS.iter().map(|p| p.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            l10n_dir: default_l10n_dir(),
            catalog_pattern: default_catalog_pattern(),
            reference_locale: default_reference_locale(),
            locales: Vec::new(),
            suggestions_file: default_suggestions_file(),
            backup_dir: default_backup_dir(),
            lookup_class: default_lookup_class(),
            import_path: default_import_path(),
            defer_marker: default_defer_marker(),
            annotate_deferred: true,
            drop_const: true,
            min_confidence: default_min_confidence(),
            max_changes: default_max_changes(),
            includes: Vec::new(),
            ignores: default_ignores(),
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns an error if any glob pattern is invalid, the catalog pattern has
    /// no `{locale}` slot, or the confidence threshold is outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.ignores {
            Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern in 'ignores': \"{}\"", pattern))?;
        }

        for pattern in &self.includes {
            if pattern.contains('*') || pattern.contains('?') {
                Pattern::new(pattern).with_context(|| {
                    format!("Invalid glob pattern in 'includes': \"{}\"", pattern)
                })?;
            }
        }

        if !self.catalog_pattern.contains(LOCALE_PLACEHOLDER) {
            bail!(
                "'catalogPattern' must contain {}: \"{}\"",
                LOCALE_PLACEHOLDER,
                self.catalog_pattern
            );
        }

        if !(0.0..=1.0).contains(&self.min_confidence) {
            bail!(
                "'minConfidence' must be between 0.0 and 1.0, got {}",
                self.min_confidence
            );
        }

        if self.lookup_class.trim().is_empty() {
            bail!("'lookupClass' must not be empty");
        }

        Ok(())
    }

    /// Catalog file name for a locale, e.g. `app_en.arb`.
    pub fn catalog_file_name(&self, locale: &str) -> String {
        self.catalog_pattern.replace(LOCALE_PLACEHOLDER, locale)
    }

    /// Inverse of [`Config::catalog_file_name`]: the locale encoded in a file name.
    pub fn locale_from_file_name(&self, file_name: &str) -> Option<String> {
        let (prefix, suffix) = self.catalog_pattern.split_once(LOCALE_PLACEHOLDER)?;
        let locale = file_name.strip_prefix(prefix)?.strip_suffix(suffix)?;
        if locale.is_empty() || locale.contains(['/', '\\']) {
            return None;
        }
        Some(locale.to_string())
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// Directory holding the config file, or the start directory when using defaults.
    pub project_root: PathBuf,
    /// True if config was loaded from a file, false if using defaults.
    pub from_file: bool,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config.validate()?;
            let project_root = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| start_dir.to_path_buf());
            Ok(ConfigLoadResult {
                config,
                project_root,
                from_file: true,
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            project_root: start_dir.to_path_buf(),
            from_file: false,
        }),
    }
}
