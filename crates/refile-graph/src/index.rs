//! In-memory wiki-link index, rebuilt on every run.

use crate::catalog::NoteCatalog;
use refile_core::WikiLink;
use refile_parser::parse_wikilinks;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Forward and reverse link maps over a vault. Paths are vault-relative.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkIndex {
    links_by_file: BTreeMap<PathBuf, Vec<WikiLink>>,
    links_to_file: BTreeMap<String, BTreeSet<PathBuf>>,
    broken_links: BTreeSet<(PathBuf, String)>,
    /// Unresolved link occurrences per file, so repeats count once each
    #[serde(default)]
    broken_by_file: BTreeMap<PathBuf, usize>,
    catalog: NoteCatalog,
}

impl LinkIndex {
    /// Empty index resolving against `catalog`
    pub fn new(catalog: NoteCatalog) -> Self {
        Self {
            catalog,
            ..Default::default()
        }
    }

    /// Index every wiki-link in `content`, attributed to `file`
    pub fn add_note(&mut self, file: impl Into<PathBuf>, content: &str) {
        let file = file.into();
        let links = parse_wikilinks(content);
        self.broken_links.retain(|(path, _)| *path != file);

        let mut broken = 0;
        for link in &links {
            let key = self.catalog.normalize(&link.target);
            if !self.catalog.contains(&key) {
                broken += 1;
                self.broken_links.insert((file.clone(), link.target.clone()));
            }
            self.links_to_file
                .entry(key)
                .or_default()
                .insert(file.clone());
        }
        self.broken_by_file.insert(file.clone(), broken);
        self.links_by_file.insert(file, links);
    }

    /// Links in `file`, in source order
    pub fn links_in(&self, file: &Path) -> &[WikiLink] {
        self.links_by_file
            .get(file)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Files referencing `target` (normalized before lookup)
    pub fn referencing(&self, target: &str) -> Vec<&Path> {
        self.links_to_file
            .get(&self.catalog.normalize(target))
            .map(|files| files.iter().map(PathBuf::as_path).collect())
            .unwrap_or_default()
    }

    /// Every normalized target referenced anywhere
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.links_to_file.keys().map(String::as_str)
    }

    /// Every indexed file with its links
    pub fn files(&self) -> impl Iterator<Item = (&Path, &[WikiLink])> {
        self.links_by_file
            .iter()
            .map(|(path, links)| (path.as_path(), links.as_slice()))
    }

    /// `(file, target as written)` for every unresolved reference
    pub fn broken_links(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.broken_links
            .iter()
            .map(|(path, target)| (path.as_path(), target.as_str()))
    }

    pub fn catalog(&self) -> &NoteCatalog {
        &self.catalog
    }

    pub fn file_count(&self) -> usize {
        self.links_by_file.len()
    }

    pub fn total_links(&self) -> usize {
        self.links_by_file.values().map(Vec::len).sum()
    }

    /// Unresolved link occurrences; a target repeated in one note counts each time.
    ///
    /// [`broken_links`](Self::broken_links) lists the distinct pairs instead.
    pub fn broken_count(&self) -> usize {
        self.broken_by_file.values().sum()
    }

    /// Broken references as a fraction of all links (0.0 for an unlinked vault)
    pub fn broken_ratio(&self) -> f64 {
        let total = self.total_links();
        if total == 0 {
            0.0
        } else {
            self.broken_count() as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> LinkIndex {
        let mut catalog = NoteCatalog::new();
        for note in ["Inbox/a.md", "Inbox/b.md", "Permanent/c.md"] {
            catalog.add_note(Path::new(note));
        }
        let mut index = LinkIndex::new(catalog);
        index.add_note("Inbox/a.md", "See [[B]] and [[c|Cee]] and [[ghost]]");
        index.add_note("Permanent/c.md", "Back to ![[b#Top]]\n[[#local]]");
        index.add_note("Inbox/b.md", "No links");
        index
    }

    #[test]
    fn test_forward_and_reverse_maps() {
        let index = index();
        assert_eq!(index.links_in(Path::new("Inbox/a.md")).len(), 3);
        assert_eq!(index.links_in(Path::new("Inbox/b.md")).len(), 0);
        assert_eq!(
            index.referencing("b"),
            vec![Path::new("Inbox/a.md"), Path::new("Permanent/c.md")]
        );
        assert_eq!(index.referencing("B.md"), index.referencing("b"));
        assert!(index.referencing("nobody").is_empty());
        assert_eq!(index.file_count(), 3);
    }

    #[test]
    fn test_broken_links() {
        let index = index();
        assert_eq!(index.total_links(), 4);
        assert_eq!(index.broken_count(), 1);
        let broken: Vec<_> = index.broken_links().collect();
        assert_eq!(broken, vec![(Path::new("Inbox/a.md"), "ghost")]);
        assert!((index.broken_ratio() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_repeated_broken_links_count_each_occurrence() {
        let mut index = LinkIndex::new(NoteCatalog::new());
        index.add_note("a.md", "[[ghost]] [[ghost]]\n[[ghost]] [[Ghost]]");
        assert_eq!(index.total_links(), 4);
        assert_eq!(index.broken_count(), 4);
        assert!((index.broken_ratio() - 1.0).abs() < f64::EPSILON);
        // Listing stays per distinct spelling
        assert_eq!(index.broken_links().count(), 2);

        // Re-indexing a note replaces its earlier count
        index.add_note("a.md", "[[ghost]]");
        assert_eq!(index.broken_count(), 1);
        assert_eq!(index.broken_links().count(), 1);
    }

    #[test]
    fn test_configured_extensions_resolve() {
        let mut catalog = NoteCatalog::with_extensions(vec!["txt".to_string()]);
        catalog.add_note(Path::new("foo.txt"));
        let mut index = LinkIndex::new(catalog);
        index.add_note("bar.txt", "[[foo.txt]] and [[foo]]");
        assert_eq!(index.broken_count(), 0);
        assert_eq!(index.referencing("foo.txt"), vec![Path::new("bar.txt")]);
    }

    #[test]
    fn test_empty_ratio() {
        let index = LinkIndex::default();
        assert_eq!(index.broken_ratio(), 0.0);
    }
}
