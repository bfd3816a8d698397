//! Known note and attachment names.

use refile_parser::{DEFAULT_NOTE_EXTENSIONS, normalize_target_with};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

/// Names a link target may resolve to.
///
/// Notes are keyed by normalized stem, attachments by their full lower-cased
/// file name (extension kept), matching how [`NoteCatalog::normalize`] folds
/// targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteCatalog {
    notes: BTreeSet<String>,
    attachments: BTreeSet<String>,
    /// Empty means the parser defaults (`md`, `markdown`)
    #[serde(default)]
    note_extensions: Vec<String>,
}

impl NoteCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog for a vault whose notes carry `extensions` (e.g. `["txt"]`)
    pub fn with_extensions(extensions: Vec<String>) -> Self {
        Self {
            note_extensions: extensions,
            ..Default::default()
        }
    }

    /// Lookup key for a link target, stripping this vault's note extensions
    pub fn normalize(&self, target: &str) -> String {
        if self.note_extensions.is_empty() {
            normalize_target_with(target, DEFAULT_NOTE_EXTENSIONS)
        } else {
            normalize_target_with(target, &self.note_extensions)
        }
    }

    /// Register a note by its path (only the stem matters)
    pub fn add_note(&mut self, path: &Path) {
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            let key = self.normalize(stem);
            self.notes.insert(key);
        }
    }

    /// Register a non-note file by its full name
    pub fn add_attachment(&mut self, path: &Path) {
        if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
            self.attachments
                .insert(name.trim().nfc().collect::<String>().to_lowercase());
        }
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
    }

    /// Resolve a normalized target to the catalog key it refers to.
    ///
    /// Exact stem or attachment name first; otherwise a note whose stem ends
    /// with the target at a non-alphanumeric boundary, so `idea` finds
    /// `202401011200 idea`. Ties go to the lexicographically first stem.
    pub fn resolve(&self, target: &str) -> Option<&str> {
        if target.is_empty() {
            return None;
        }
        if let Some(exact) = self.notes.get(target) {
            return Some(exact);
        }
        if let Some(exact) = self.attachments.get(target) {
            return Some(exact);
        }
        self.notes
            .iter()
            .find(|stem| is_prefixed_match(stem, target))
            .map(String::as_str)
    }

    pub fn contains(&self, target: &str) -> bool {
        self.resolve(target).is_some()
    }
}

fn is_prefixed_match(stem: &str, target: &str) -> bool {
    if stem.len() <= target.len() {
        return false;
    }
    match stem.strip_suffix(target) {
        Some(prefix) => prefix
            .chars()
            .next_back()
            .is_some_and(|c| !c.is_alphanumeric()),
        None => false,
    }
}
