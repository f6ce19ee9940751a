//! Catalog Store: one ARB document per locale.
//!
//! Documents are flat JSON objects. `@@locale` records the locale tag and
//! `@<key>` entries hold metadata; neither is a translation entry. Insertion
//! order is kept so rewritten documents diff cleanly.

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::{
    config::Config,
    core::error::{EngineError, EngineResult},
    utils::write_atomic,
};

/// Reserved prefix of metadata keys.
pub const METADATA_PREFIX: char = '@';
/// Reserved key holding the locale tag.
pub const LOCALE_KEY: &str = "@@locale";

/// Placeholder text stored in a non-reference locale.
pub fn placeholder(locale: &str, text: &str) -> String {
    format!("[{}] {}", locale.to_uppercase(), text)
}

/// A key to add, with the reference text and its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub key: String,
    pub text: String,
    pub context: String,
}

/// One locale's catalog document.
#[derive(Debug, Clone)]
pub struct CatalogDocument {
    locale: String,
    path: PathBuf,
    data: Map<String, Value>,
    dirty: bool,
}

impl CatalogDocument {
    /// Read the document at `path`; an absent file is an empty catalog.
    pub fn open_or_create(path: &Path, locale: &str) -> EngineResult<Self> {
        let read_error = |reason: String| EngineError::CatalogRead {
            path: path.to_path_buf(),
            reason,
        };

        let data = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| read_error(e.to_string()))?;
            let value: Value =
                serde_json::from_str(&content).map_err(|e| read_error(e.to_string()))?;
            match value {
                Value::Object(map) => map,
                _ => return Err(read_error("root must be an object".to_string())),
            }
        } else {
            let mut map = Map::new();
            map.insert(LOCALE_KEY.to_string(), Value::String(locale.to_string()));
            map
        };

        Ok(Self {
            locale: locale.to_string(),
            path: path.to_path_buf(),
            data,
            dirty: false,
        })
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The whole document, metadata included.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Translation keys, metadata excluded.
    pub fn keys(&self) -> BTreeSet<String> {
        self.data
            .keys()
            .filter(|k| !k.starts_with(METADATA_PREFIX))
            .cloned()
            .collect()
    }

    /// `(key, text)` translation entries in document order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.data.iter().filter_map(|(k, v)| {
            if k.starts_with(METADATA_PREFIX) {
                return None;
            }
            v.as_str().map(|text| (k.as_str(), text))
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Insert `key` unless present. Returns whether it was inserted.
    fn insert(&mut self, key: &str, text: String, metadata: Option<Value>) -> bool {
        if self.data.contains_key(key) {
            return false;
        }
        self.data.insert(key.to_string(), Value::String(text));
        if let Some(metadata) = metadata {
            let meta_key = format!("{}{}", METADATA_PREFIX, key);
            self.data.entry(meta_key).or_insert(metadata);
        }
        self.dirty = true;
        true
    }

    /// Write the document back with 2-space indentation and a trailing newline.
    pub fn save(&mut self) -> EngineResult<()> {
        let write_error = |source: std::io::Error| EngineError::CatalogWrite {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        let content = serde_json::to_string_pretty(&Value::Object(self.data.clone()))
            .map_err(|e| write_error(e.into()))?;
        write_atomic(&self.path, &format!("{}\n", content)).map_err(write_error)?;
        self.dirty = false;
        Ok(())
    }
}

/// Counts from a catalog update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogDelta {
    /// New keys in the reference locale.
    pub keys_added: usize,
    /// Placeholder entries added across the other locales.
    pub placeholders_added: usize,
}

/// All locale catalogs of a project, reference locale first.
pub struct CatalogStore {
    reference_locale: String,
    documents: Vec<CatalogDocument>,
}

impl CatalogStore {
    /// Discover and load every locale catalog under `dir`.
    ///
    /// Locales are the reference locale, those found on disk by the file name
    /// pattern, and the configured extras. A malformed document fails the
    /// whole open.
    pub fn open(dir: &Path, config: &Config) -> EngineResult<Self> {
        let mut locales: BTreeSet<String> = config.locales.iter().cloned().collect();
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let name = entry.file_name();
                if let Some(locale) = config.locale_from_file_name(&name.to_string_lossy()) {
                    locales.insert(locale);
                }
            }
        }
        locales.remove(&config.reference_locale);

        let mut documents = Vec::with_capacity(locales.len() + 1);
        for locale in std::iter::once(&config.reference_locale).chain(locales.iter()) {
            let path = dir.join(config.catalog_file_name(locale));
            let document = CatalogDocument::open_or_create(&path, locale)?;
            debug!(locale = %locale, path = %path.display(), "loaded catalog");
            documents.push(document);
        }
        info!(locales = documents.len(), "opened catalogs");

        Ok(Self {
            reference_locale: config.reference_locale.clone(),
            documents,
        })
    }

    pub fn reference_locale(&self) -> &str {
        &self.reference_locale
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(CatalogDocument::locale)
    }

    pub fn reference(&self) -> &CatalogDocument {
        // `open` always puts the reference document first
        &self.documents[0]
    }

    pub fn document(&self, locale: &str) -> Option<&CatalogDocument> {
        self.documents.iter().find(|d| d.locale == locale)
    }

    fn document_mut(&mut self, locale: &str) -> Option<&mut CatalogDocument> {
        self.documents.iter_mut().find(|d| d.locale == locale)
    }

    /// Full mapping of a locale's document, or `None` for an unknown locale.
    pub fn load(&self, locale: &str) -> Option<&Map<String, Value>> {
        self.document(locale).map(CatalogDocument::data)
    }

    /// Translation keys of a locale.
    pub fn keys(&self, locale: &str) -> BTreeSet<String> {
        self.document(locale)
            .map(CatalogDocument::keys)
            .unwrap_or_default()
    }

    fn is_reference(&self, locale: &str) -> bool {
        locale == self.reference_locale
    }

    fn insert_entries(&mut self, locale: &str, entries: &[NewEntry]) -> usize {
        let reference = self.is_reference(locale);
        let Some(document) = self.document_mut(locale) else {
            return 0;
        };
        let mut added = 0;
        for entry in entries {
            let text = if reference {
                entry.text.clone()
            } else {
                placeholder(locale, &entry.text)
            };
            let metadata = json!({
                "description": format!("Auto-generated from {}", entry.context)
            });
            if document.insert(&entry.key, text, Some(metadata)) {
                added += 1;
            }
        }
        added
    }

    /// Add keys to one locale and write it back. Existing keys are left alone;
    /// non-reference locales store a placeholder instead of the text.
    pub fn add_keys(&mut self, locale: &str, entries: &[NewEntry]) -> EngineResult<usize> {
        let added = self.insert_entries(locale, entries);
        if added > 0 {
            if let Some(document) = self.document_mut(locale) {
                document.save()?;
            }
            info!(locale = %locale, added, "added catalog keys");
        }
        Ok(added)
    }

    /// Fill every non-reference locale with the reference keys it lacks.
    fn fill_missing(&mut self) -> usize {
        let (reference, others) = self.documents.split_at_mut(1);
        let reference = &reference[0];
        let mut added = 0;
        for document in others {
            let locale = document.locale.clone();
            for (key, text) in reference.entries() {
                let metadata = reference
                    .data
                    .get(&format!("{}{}", METADATA_PREFIX, key))
                    .cloned();
                if document.insert(key, placeholder(&locale, text), metadata) {
                    added += 1;
                }
            }
        }
        added
    }

    fn save_dirty(&mut self) -> EngineResult<()> {
        for document in self.documents.iter_mut().filter(|d| d.dirty) {
            document.save()?;
            debug!(path = %document.path.display(), "wrote catalog");
        }
        Ok(())
    }

    /// Add `entries` to the reference locale, then sync every other locale.
    ///
    /// With `write` unset the documents are only changed in memory, which
    /// gives the counts a real run would produce.
    pub fn update(&mut self, entries: &[NewEntry], write: bool) -> EngineResult<CatalogDelta> {
        let reference = self.reference_locale.clone();
        let keys_added = self.insert_entries(&reference, entries);
        let placeholders_added = self.fill_missing();
        if write {
            self.save_dirty()?;
        }
        info!(keys_added, placeholders_added, "updated catalogs");
        Ok(CatalogDelta {
            keys_added,
            placeholders_added,
        })
    }
}
