//! Exclude-aware vault traversal.

use refile_core::{BackupError, ReorgConfig, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Matches path components against exclude names and glob patterns
#[derive(Debug, Clone, Default)]
pub struct ExcludeMatcher {
    names: HashSet<String>,
    patterns: Vec<glob::Pattern>,
}

impl ExcludeMatcher {
    /// Build from a mixed list: entries with glob metacharacters become patterns.
    pub fn new<S: AsRef<str>>(entries: &[S]) -> Self {
        let mut matcher = Self::default();
        for entry in entries {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                continue;
            }
            if entry.contains(['*', '?', '[']) {
                match glob::Pattern::new(entry) {
                    Ok(pattern) => matcher.patterns.push(pattern),
                    Err(e) => {
                        log::warn!("Ignoring invalid exclude pattern '{}': {}", entry, e);
                    }
                }
            } else {
                matcher.names.insert(entry.to_string());
            }
        }
        matcher
    }

    /// Whether a single file or directory name is excluded
    pub fn is_excluded_name(&self, name: &str) -> bool {
        self.names.contains(name) || self.patterns.iter().any(|p| p.matches(name))
    }

    /// Whether any component of a vault-relative path is excluded
    pub fn is_excluded(&self, relative: &Path) -> bool {
        relative
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .any(|name| self.is_excluded_name(name))
    }
}

/// Walks a vault, pruning excluded directories and never following symlinks
#[derive(Debug, Clone)]
pub struct VaultWalker {
    root: PathBuf,
    excludes: ExcludeMatcher,
    note_extensions: Vec<String>,
}

impl VaultWalker {
    pub fn new(config: &ReorgConfig) -> Self {
        Self {
            root: config.vault_root.clone(),
            excludes: ExcludeMatcher::new(&config.exclude),
            note_extensions: config.note_extensions.clone(),
        }
    }

    /// Walker over an arbitrary tree with the given excludes (all files are "notes")
    pub fn for_tree(root: impl Into<PathBuf>, excludes: ExcludeMatcher) -> Self {
        Self {
            root: root.into(),
            excludes,
            note_extensions: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn excludes(&self) -> &ExcludeMatcher {
        &self.excludes
    }

    fn keep(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        entry
            .file_name()
            .to_str()
            .map(|name| !self.excludes.is_excluded_name(name))
            .unwrap_or(true)
    }

    fn is_note(&self, path: &Path) -> bool {
        if self.note_extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.note_extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }

    /// Visit every non-excluded entry below the root (root itself excluded).
    ///
    /// Entries come in sorted order so results do not depend on directory order.
    pub fn entries(&self) -> Result<Vec<DirEntry>> {
        if !self.root.is_dir() {
            return Err(BackupError::vault_missing(&self.root));
        }
        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| self.keep(e))
        {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
                let io = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
                BackupError::storage(path, io)
            })?;
            if entry.depth() > 0 {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Every regular file (absolute paths)
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| e.file_type().is_file())
            .map(DirEntry::into_path)
            .collect())
    }

    /// Every note file (absolute paths)
    pub fn notes(&self) -> Result<Vec<PathBuf>> {
        Ok(self
            .files()?
            .into_iter()
            .filter(|p| self.is_note(p))
            .collect())
    }

    /// Vault-relative form of an absolute path under the root
    pub fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}
