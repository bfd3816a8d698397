//! Error types for vault reorganization.
//!
//! Every failure that threatens data integrity is a [`BackupError`]. Problems
//! that only degrade a plan (malformed metadata, unknown categories, broken
//! links) are collected into reports instead and never surface here.

use std::io;
use std::path::PathBuf;
use thiserror::Error as ThisError;

/// The error type for all reorganization operations.
#[derive(ThisError, Debug)]
pub enum BackupError {
    /// Backup root equals or lives inside the vault root
    #[error("Backup root {backup_root} is nested inside vault {vault}")]
    NestedBackupRoot { vault: PathBuf, backup_root: PathBuf },

    /// Vault root does not exist or is not a directory
    #[error("Vault root not found: {path}")]
    VaultMissing { path: PathBuf },

    /// Filesystem failure on vault or backup storage
    #[error("Storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No backup session with this id
    #[error("Backup session not found: {id}")]
    SessionNotFound { id: String },

    /// Backup session exists but holds no files
    #[error("Backup session is empty: {id}")]
    EmptyBackup { id: String },

    /// Fresh plan has conflicts, refusing to execute
    #[error("Plan has {} conflict(s): {}", conflicts.len(), conflicts.join("; "))]
    Conflicts { conflicts: Vec<String> },

    /// A move target appeared after planning
    #[error("Target already exists, refusing to overwrite: {} -> {}", source_path.display(), target.display())]
    TargetExists {
        source_path: PathBuf,
        target: PathBuf,
    },

    /// Rename failed
    #[error("Failed to move {} -> {}: {reason}", source_path.display(), target.display())]
    MoveFailed {
        source_path: PathBuf,
        target: PathBuf,
        reason: String,
    },

    /// Rollback could not restore the vault
    #[error("Rollback to {id} failed: {reason}")]
    RollbackFailed { id: String, reason: String },

    /// Invalid configuration
    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, BackupError>;

impl BackupError {
    /// Create a storage error for `path`
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BackupError::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a nested backup root error
    pub fn nested(vault: impl Into<PathBuf>, backup_root: impl Into<PathBuf>) -> Self {
        BackupError::NestedBackupRoot {
            vault: vault.into(),
            backup_root: backup_root.into(),
        }
    }

    /// Create a vault missing error
    pub fn vault_missing(path: impl Into<PathBuf>) -> Self {
        BackupError::VaultMissing { path: path.into() }
    }

    /// Create a session not found error
    pub fn session_not_found(id: impl Into<String>) -> Self {
        BackupError::SessionNotFound { id: id.into() }
    }

    /// Create a target exists error
    pub fn target_exists(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        BackupError::TargetExists {
            source_path: source.into(),
            target: target.into(),
        }
    }

    /// Create a move failure error
    pub fn move_failed(
        source: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        BackupError::MoveFailed {
            source_path: source.into(),
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Create a rollback failure error
    pub fn rollback_failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        BackupError::RollbackFailed {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(reason: impl Into<String>) -> Self {
        BackupError::Config {
            reason: reason.into(),
        }
    }

    /// Whether this error was raised before anything was written
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NestedBackupRoot { .. }
                | Self::VaultMissing { .. }
                | Self::Conflicts { .. }
                | Self::Config { .. }
        )
    }
}
