//! Reorganization configuration.
//!
//! Follows a builder pattern for complex configuration with validation. The
//! category → directory mapping is injected here so that new categories never
//! require touching the planner.

use crate::error::{BackupError, Result};
use crate::utils::PathValidator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Directory names skipped by every traversal unless overridden.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".git",
    ".obsidian",
    ".trash",
    "__pycache__",
    ".venv",
    "venv",
    "node_modules",
    ".cache",
    ".refile-backups",
];

/// Default category mapping for a PARA/Zettelkasten style vault.
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("inbox", "Inbox"),
    ("permanent", "Permanent"),
    ("literature", "Literature"),
    ("fleeting", "Fleeting"),
];

fn default_excludes() -> Vec<String> {
    DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect()
}

fn default_categories() -> BTreeMap<String, String> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn default_extensions() -> Vec<String> {
    vec!["md".to_string()]
}

/// Configuration for one vault reorganization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorgConfig {
    /// Root directory of the vault
    pub vault_root: PathBuf,
    /// Directory holding backup sessions (must not be inside the vault)
    pub backup_root: PathBuf,
    /// Lower-cased category name → vault-relative directory
    #[serde(default = "default_categories")]
    pub categories: BTreeMap<String, String>,
    /// Names or glob patterns skipped during traversal and backup
    #[serde(default = "default_excludes")]
    pub exclude: Vec<String>,
    /// File extensions (without dot) treated as notes
    #[serde(default = "default_extensions")]
    pub note_extensions: Vec<String>,
    /// Keep the backup session after a successful execution
    #[serde(default)]
    pub keep_backup_on_success: bool,
}

impl ReorgConfig {
    /// Create a new config with builder
    pub fn builder(
        vault_root: impl Into<PathBuf>,
        backup_root: impl Into<PathBuf>,
    ) -> ReorgConfigBuilder {
        ReorgConfigBuilder::new(vault_root, backup_root)
    }

    /// Load from a TOML/YAML/JSON file, with `REFILE_*` environment overrides.
    ///
    /// `vault_root` and `backup_root` go through tilde and env-var expansion.
    pub fn from_file(path: &Path) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(
                ::config::Environment::with_prefix("REFILE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| {
                BackupError::config_error(format!("Failed to load {}: {}", path.display(), e))
            })?;

        let mut loaded: ReorgConfig = settings
            .try_deserialize()
            .map_err(|e| BackupError::config_error(format!("Invalid configuration: {}", e)))?;

        loaded.vault_root = PathValidator::expand(&loaded.vault_root)?;
        loaded.backup_root = PathValidator::expand(&loaded.backup_root)?;
        loaded.categories = loaded
            .categories
            .into_iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v))
            .collect();
        loaded.validate()?;
        Ok(loaded)
    }

    /// Validate the configuration without touching the filesystem
    pub fn validate(&self) -> Result<()> {
        if self.vault_root.as_os_str().is_empty() {
            return Err(BackupError::config_error("Vault root cannot be empty"));
        }
        if self.backup_root.as_os_str().is_empty() {
            return Err(BackupError::config_error("Backup root cannot be empty"));
        }
        if self.categories.is_empty() {
            return Err(BackupError::config_error(
                "At least one category mapping must be configured",
            ));
        }
        for (category, dir) in &self.categories {
            let dir_path = Path::new(dir);
            if dir.trim().is_empty() || dir_path.is_absolute() || !PathValidator::is_confined(dir_path)
            {
                return Err(BackupError::config_error(format!(
                    "Category '{}' maps to invalid directory '{}' (must be vault-relative)",
                    category, dir
                )));
            }
        }
        if self.note_extensions.is_empty() {
            return Err(BackupError::config_error(
                "At least one note extension must be configured",
            ));
        }
        if PathValidator::is_nested(&self.vault_root, &self.backup_root) {
            return Err(BackupError::nested(&self.vault_root, &self.backup_root));
        }
        Ok(())
    }

    /// Vault-relative directory for a category, if registered
    pub fn directory_for(&self, category: &str) -> Option<&str> {
        self.categories
            .get(&category.trim().to_lowercase())
            .map(String::as_str)
    }

    /// Name used as the prefix of backup session directories
    pub fn vault_name(&self) -> String {
        self.vault_root
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("vault")
            .to_string()
    }

    /// Whether `path` has one of the configured note extensions
    pub fn is_note(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.note_extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }
}

/// Builder for ReorgConfig
pub struct ReorgConfigBuilder {
    vault_root: PathBuf,
    backup_root: PathBuf,
    categories: BTreeMap<String, String>,
    exclude: Vec<String>,
    note_extensions: Vec<String>,
    keep_backup_on_success: bool,
}

impl ReorgConfigBuilder {
    /// Create a new builder with default categories and excludes
    pub fn new(vault_root: impl Into<PathBuf>, backup_root: impl Into<PathBuf>) -> Self {
        Self {
            vault_root: vault_root.into(),
            backup_root: backup_root.into(),
            categories: default_categories(),
            exclude: default_excludes(),
            note_extensions: default_extensions(),
            keep_backup_on_success: false,
        }
    }

    /// Register (or replace) a category mapping
    pub fn category(mut self, category: &str, directory: impl Into<String>) -> Self {
        self.categories
            .insert(category.trim().to_lowercase(), directory.into());
        self
    }

    /// Replace the whole category mapping
    pub fn categories<I, K, V>(mut self, mapping: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        self.categories = mapping
            .into_iter()
            .map(|(k, v)| (k.as_ref().trim().to_lowercase(), v.into()))
            .collect();
        self
    }

    /// Add an exclude name or glob pattern
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    /// Set the note extensions (without dot)
    pub fn note_extensions(mut self, extensions: Vec<String>) -> Self {
        self.note_extensions = extensions;
        self
    }

    /// Keep backup sessions after successful runs
    pub fn keep_backup_on_success(mut self, keep: bool) -> Self {
        self.keep_backup_on_success = keep;
        self
    }

    /// Build and validate
    pub fn build(self) -> Result<ReorgConfig> {
        let config = ReorgConfig {
            vault_root: self.vault_root,
            backup_root: self.backup_root,
            categories: self.categories,
            exclude: self.exclude,
            note_extensions: self.note_extensions,
            keep_backup_on_success: self.keep_backup_on_success,
        };
        config.validate()?;
        Ok(config)
    }
}
