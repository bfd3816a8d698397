//! Shared utilities for operations across refile crates.
//!
//! Provides DRY helpers for:
//! - Path normalization and nesting checks
//! - Shell-style path expansion
//! - Transaction tracking

use crate::error::{BackupError, Result};
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

/// Path validation helpers
pub struct PathValidator;

impl PathValidator {
    /// Lexically normalize a path: drop `.`, resolve `..` against earlier components.
    pub fn normalize(path: &Path) -> PathBuf {
        let mut normalized = PathBuf::new();
        for component in path.components() {
            match component {
                Component::ParentDir => {
                    normalized.pop();
                }
                Component::Normal(name) => {
                    normalized.push(name);
                }
                Component::RootDir => {
                    normalized.push(component);
                }
                Component::CurDir => {}
                Component::Prefix(p) => {
                    normalized.push(p.as_os_str());
                }
            }
        }
        normalized
    }

    /// Absolute, normalized form of a path (relative paths resolve against cwd).
    pub fn absolute(path: &Path) -> PathBuf {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        };
        Self::normalize(&joined)
    }

    /// True when `candidate` equals `root` or lives anywhere beneath it.
    ///
    /// Purely lexical first so it works before either directory exists; when
    /// both exist the canonical forms are compared too, catching symlinked roots.
    pub fn is_nested(root: &Path, candidate: &Path) -> bool {
        let root_abs = Self::absolute(root);
        let candidate_abs = Self::absolute(candidate);
        if candidate_abs.starts_with(&root_abs) {
            return true;
        }

        match (root.canonicalize(), Self::canonical_prefix(candidate)) {
            (Ok(root_canon), Some(candidate_canon)) => candidate_canon.starts_with(root_canon),
            _ => false,
        }
    }

    /// Canonicalize the longest existing ancestor and re-append the rest.
    fn canonical_prefix(path: &Path) -> Option<PathBuf> {
        let abs = Self::absolute(path);
        let mut existing = abs.as_path();
        let mut tail = Vec::new();
        loop {
            if let Ok(canon) = existing.canonicalize() {
                let mut out = canon;
                for part in tail.iter().rev() {
                    out.push(part);
                }
                return Some(out);
            }
            tail.push(existing.file_name()?.to_os_string());
            existing = existing.parent()?;
        }
    }

    /// True when a relative path never climbs above its starting point.
    pub fn is_confined(path: &Path) -> bool {
        let mut depth: usize = 0;
        for component in path.components() {
            match component {
                Component::Normal(_) => depth += 1,
                Component::CurDir => {}
                Component::ParentDir => {
                    if depth == 0 {
                        return false;
                    }
                    depth -= 1;
                }
                Component::RootDir | Component::Prefix(_) => return false,
            }
        }
        true
    }

    /// Expand `~` and environment variables, then make absolute.
    ///
    /// Uses shellexpand for tilde/env expansion.
    pub fn expand(path: &Path) -> Result<PathBuf> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackupError::config_error("Path contains invalid UTF-8"))?;

        let expanded = shellexpand::full(path_str).map_err(|e| {
            BackupError::config_error(format!("Failed to expand path {}: {}", path_str, e))
        })?;

        Ok(Self::absolute(Path::new(expanded.as_ref())))
    }

    /// Vault-relative form of `path`, if it lives under `root`
    pub fn relative_to(root: &Path, path: &Path) -> Option<PathBuf> {
        path.strip_prefix(root).ok().map(Path::to_path_buf)
    }
}

/// Transaction tracking utilities
pub struct TransactionBuilder {
    transaction_id: String,
    start_time: Instant,
}

impl TransactionBuilder {
    /// Create a new transaction tracker
    pub fn new() -> Self {
        Self {
            transaction_id: uuid::Uuid::new_v4().to_string(),
            start_time: Instant::now(),
        }
    }

    /// Get the transaction ID
    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
