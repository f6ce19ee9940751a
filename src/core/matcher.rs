//! Suggestion loading and the confidence filter.

use std::{
    collections::{BTreeSet, HashMap},
    fs,
    path::Path,
    sync::LazyLock,
};

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::core::error::{EngineError, EngineResult};

/// Widget types allowed to carry very short text.
const SHORT_TEXT_WIDGETS: &[&str] = &["button", "label"];

/// Minimum trimmed length for text outside [`SHORT_TEXT_WIDGETS`].
const MIN_TEXT_LEN: usize = 3;

/// Keys must be emitted as Dart getters.
static KEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap());

/// Where a suggestion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The suggestion document written by an analysis pass; keys are new.
    Analysis,
    /// Direct text match against the reference catalog; keys are reused.
    Catalog,
}

/// A proposed (key, text) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub key: String,
    pub value: String,
    pub confidence: f64,
    /// Free-text provenance; names the source unit the text was found in.
    pub context: String,
    pub widget_type: String,
    pub origin: Origin,
}

impl Suggestion {
    /// Whether `context` names the project-relative `unit` path as a whole
    /// path: `lib/a.dart` matches `Found in lib/a.dart` and
    /// `packages/app/lib/a.dart`, but not `my_lib/a.dart` or `lib/a.dart.bak`.
    pub fn mentions_unit(&self, unit: &str) -> bool {
        if unit.is_empty() {
            return false;
        }
        let is_path_char = |c: char| c.is_alphanumeric() || c == '_' || c == '-';
        self.context.match_indices(unit).any(|(start, _)| {
            let before = self.context[..start].chars().next_back();
            let after = self.context[start + unit.len()..].chars().next();
            !before.is_some_and(is_path_char)
                && !after.is_some_and(|c| is_path_char(c) || c == '/')
        })
    }
}

/// One entry of the suggestion document.
#[derive(Debug, Deserialize)]
struct SuggestionData {
    value: String,
    #[serde(default)]
    confidence: f64,
    #[serde(default, alias = "context")]
    description: String,
    #[serde(default)]
    widget_type: String,
}

/// Read the suggestion document, keeping its entry order.
pub fn load_suggestions(path: &Path) -> EngineResult<Vec<Suggestion>> {
    let read_error = |reason: String| EngineError::SuggestionRead {
        path: path.to_path_buf(),
        reason,
    };

    let content = fs::read_to_string(path).map_err(|e| read_error(e.to_string()))?;
    let document: Map<String, Value> =
        serde_json::from_str(&content).map_err(|e| read_error(e.to_string()))?;

    let mut suggestions = Vec::with_capacity(document.len());
    for (key, entry) in document {
        let data: SuggestionData =
            serde_json::from_value(entry).map_err(|e| read_error(format!("{}: {}", key, e)))?;
        suggestions.push(Suggestion {
            key,
            value: data.value,
            confidence: data.confidence,
            context: data.description,
            widget_type: data.widget_type,
            origin: Origin::Analysis,
        });
    }
    info!(path = %path.display(), count = suggestions.len(), "loaded suggestions");
    Ok(suggestions)
}

/// Why a suggestion was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Exclusion {
    LowConfidence,
    Template,
    TooShort,
    AllCaps,
    KeyExists,
    InvalidKey,
}

impl std::fmt::Display for Exclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Exclusion::LowConfidence => "below confidence threshold",
            Exclusion::Template => "template marker",
            Exclusion::TooShort => "too short",
            Exclusion::AllCaps => "all caps",
            Exclusion::KeyExists => "key already exists",
            Exclusion::InvalidKey => "invalid key",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Default)]
pub struct FilterOutcome {
    /// Accepted suggestions in input order, at most `max_changes` of them.
    pub accepted: Vec<Suggestion>,
    pub excluded: Vec<(Suggestion, Exclusion)>,
    /// Suggestions that passed every rule but fell beyond the cap.
    pub truncated: usize,
}

pub struct Matcher {
    pub min_confidence: f64,
    pub max_changes: usize,
}

impl Matcher {
    pub fn new(min_confidence: f64, max_changes: usize) -> Self {
        Self {
            min_confidence,
            max_changes,
        }
    }

    /// First rule the suggestion fails, if any.
    pub fn check(
        &self,
        suggestion: &Suggestion,
        existing_keys: &BTreeSet<String>,
    ) -> Option<Exclusion> {
        let value = &suggestion.value;
        if suggestion.confidence < self.min_confidence {
            return Some(Exclusion::LowConfidence);
        }
        if value.contains('$') {
            return Some(Exclusion::Template);
        }
        if value.trim().chars().count() < MIN_TEXT_LEN
            && !SHORT_TEXT_WIDGETS.contains(&suggestion.widget_type.as_str())
        {
            return Some(Exclusion::TooShort);
        }
        if is_all_caps(value) && !value.contains(' ') {
            return Some(Exclusion::AllCaps);
        }
        if suggestion.origin == Origin::Analysis && existing_keys.contains(&suggestion.key) {
            return Some(Exclusion::KeyExists);
        }
        if !KEY_REGEX.is_match(&suggestion.key) {
            return Some(Exclusion::InvalidKey);
        }
        None
    }

    /// Apply the rules in order, then the change cap.
    pub fn filter(
        &self,
        suggestions: Vec<Suggestion>,
        existing_keys: &BTreeSet<String>,
    ) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();
        for suggestion in suggestions {
            match self.check(&suggestion, existing_keys) {
                Some(reason) => {
                    debug!(key = %suggestion.key, %reason, "suggestion excluded");
                    outcome.excluded.push((suggestion, reason));
                }
                None if outcome.accepted.len() < self.max_changes => {
                    outcome.accepted.push(suggestion);
                }
                None => outcome.truncated += 1,
            }
        }
        if outcome.truncated > 0 {
            warn!(
                max_changes = self.max_changes,
                dropped = outcome.truncated,
                "limiting changes for safety"
            );
        }
        info!(
            accepted = outcome.accepted.len(),
            excluded = outcome.excluded.len(),
            "filtered suggestions"
        );
        outcome
    }
}

/// At least one cased character and no lowercase ones.
fn is_all_caps(value: &str) -> bool {
    let mut cased = false;
    for c in value.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

/// Reference catalog inverted: trimmed text to the first key carrying it.
pub struct CatalogIndex {
    by_text: HashMap<String, String>,
}

impl CatalogIndex {
    /// Build from `(key, text)` entries in document order.
    ///
    /// Texts with ARB placeholders (`{name}`) cannot stand in for a plain
    /// literal and are left out.
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut by_text = HashMap::new();
        for (key, text) in entries {
            let text = text.trim();
            if text.is_empty() || text.contains('{') {
                continue;
            }
            by_text
                .entry(text.to_string())
                .or_insert_with(|| key.to_string());
        }
        Self { by_text }
    }

    pub fn len(&self) -> usize {
        self.by_text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_text.is_empty()
    }

    /// Suggestion for a literal found in `unit`, if its text is in the catalog.
    pub fn suggest(&self, value: &str, unit: &str) -> Option<Suggestion> {
        self.by_text.get(value.trim()).map(|key| Suggestion {
            key: key.clone(),
            value: value.to_string(),
            confidence: 1.0,
            context: unit.to_string(),
            widget_type: String::new(),
            origin: Origin::Catalog,
        })
    }
}
