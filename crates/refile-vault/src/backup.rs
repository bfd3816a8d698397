//! Backup sessions: whole-vault snapshots with rollback and retention.
//!
//! A session is a plain directory under the backup root named
//! `<vault-name>-<YYYYMMDD-HHMMSS>` (plus `-NN` when two sessions land in the
//! same second). The backup root may never live inside the vault; this is
//! checked when the manager is constructed, before any filesystem access.

use crate::digest::TreeDigest;
use crate::walker::{ExcludeMatcher, VaultWalker};
use chrono::{Local, NaiveDateTime};
use refile_core::{
    BackupError, BackupSessionId, PathValidator, ReorgConfig, Result, SharedObserver,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const COMPONENT: &str = "backup";
const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
const TIMESTAMP_LEN: usize = 15;
const MAX_SAME_SECOND: u32 = 99;

/// A session found under the backup root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupInfo {
    pub id: BackupSessionId,
    pub path: PathBuf,
    pub created_at: NaiveDateTime,
    /// Same-second collision counter (0 for the first session)
    pub sequence: u32,
    pub file_count: usize,
}

/// What `prune` kept and deleted (or would delete, in dry-run mode)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneReport {
    pub kept: Vec<BackupSessionId>,
    pub deleted: Vec<BackupSessionId>,
    pub dry_run: bool,
}

/// Outcome of a rollback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackReport {
    pub session_id: BackupSessionId,
    /// Snapshot of the pre-rollback state, when it could be taken
    pub emergency_backup: Option<BackupSessionId>,
    pub restored_files: usize,
    pub expected_files: usize,
    /// Restored tree digest equals the backup digest
    pub verified: bool,
}

/// Creates, restores, lists and prunes backup sessions for one vault
pub struct BackupManager {
    vault_root: PathBuf,
    backup_root: PathBuf,
    vault_name: String,
    excludes: ExcludeMatcher,
    observer: SharedObserver,
}

impl BackupManager {
    /// Create a manager. Fails with `NestedBackupRoot` before touching the disk
    /// when the backup root is the vault or lies inside it.
    pub fn new(config: &ReorgConfig, observer: SharedObserver) -> Result<Self> {
        if PathValidator::is_nested(&config.vault_root, &config.backup_root) {
            return Err(BackupError::nested(&config.vault_root, &config.backup_root));
        }
        Ok(Self {
            vault_root: config.vault_root.clone(),
            backup_root: config.backup_root.clone(),
            vault_name: config.vault_name(),
            excludes: ExcludeMatcher::new(&config.exclude),
            observer,
        })
    }

    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }

    /// Directory holding `id`
    pub fn session_path(&self, id: &BackupSessionId) -> PathBuf {
        self.backup_root.join(id.as_str())
    }

    fn vault_walker(&self) -> VaultWalker {
        VaultWalker::for_tree(&self.vault_root, self.excludes.clone())
    }

    fn session_walker(&self, id: &BackupSessionId) -> VaultWalker {
        VaultWalker::for_tree(self.session_path(id), ExcludeMatcher::default())
    }

    /// Snapshot the vault (minus excluded paths) into a new session
    #[tracing::instrument(skip(self), fields(vault = %self.vault_root.display()))]
    pub fn create_backup(&self) -> Result<BackupSessionId> {
        if !self.vault_root.is_dir() {
            return Err(BackupError::vault_missing(&self.vault_root));
        }
        fs::create_dir_all(&self.backup_root)
            .map_err(|e| BackupError::storage(&self.backup_root, e))?;

        let id = self.claim_session_dir()?;
        let session = self.session_path(&id);

        match copy_tree(&self.vault_walker(), &session, &self.observer) {
            Ok(copied) => {
                self.observer.info(
                    COMPONENT,
                    &format!("Created backup {} ({} files)", id, copied),
                );
                Ok(id)
            }
            Err(e) => {
                // A partial snapshot is worse than none
                if let Err(cleanup) = fs::remove_dir_all(&session) {
                    self.observer.warn(
                        COMPONENT,
                        &format!("Failed to remove partial backup {}: {}", id, cleanup),
                    );
                }
                Err(e)
            }
        }
    }

    /// Atomically claim a fresh session directory name
    fn claim_session_dir(&self) -> Result<BackupSessionId> {
        let base = format!("{}-{}", self.vault_name, Local::now().format(TIMESTAMP_FORMAT));
        for sequence in 0..=MAX_SAME_SECOND {
            let name = if sequence == 0 {
                base.clone()
            } else {
                format!("{}-{:02}", base, sequence)
            };
            let path = self.backup_root.join(&name);
            match fs::create_dir(&path) {
                Ok(()) => return Ok(BackupSessionId::new(name)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(BackupError::storage(path, e)),
            }
        }
        Err(BackupError::storage(
            self.backup_root.join(&base),
            io::Error::new(
                io::ErrorKind::AlreadyExists,
                "too many backup sessions created within one second",
            ),
        ))
    }

    /// Number of files in a session; fails for missing or empty sessions
    pub fn validate_backup(&self, id: &BackupSessionId) -> Result<usize> {
        let path = self.session_path(id);
        if !path.is_dir() {
            return Err(BackupError::session_not_found(id.as_str()));
        }
        let count = self.session_walker(id).files()?.len();
        if count == 0 {
            return Err(BackupError::EmptyBackup {
                id: id.as_str().to_string(),
            });
        }
        Ok(count)
    }

    /// Replace the vault with the contents of session `id`.
    ///
    /// The current state is snapshotted first (best effort). Paths excluded
    /// from backups are left untouched, since the session never held them.
    #[tracing::instrument(skip(self), fields(session = %id))]
    pub fn rollback(&self, id: &BackupSessionId) -> Result<RollbackReport> {
        let expected_files = self.validate_backup(id)?;
        let expected = TreeDigest::compute(&self.session_walker(id))?;

        let emergency_backup = match self.create_backup() {
            Ok(emergency) => {
                self.observer.info(
                    COMPONENT,
                    &format!("Emergency backup {} taken before rollback", emergency),
                );
                Some(emergency)
            }
            Err(e) => {
                self.observer.error(
                    COMPONENT,
                    &format!("Emergency backup failed, rolling back anyway: {}", e),
                );
                None
            }
        };

        fs::create_dir_all(&self.vault_root)
            .map_err(|e| BackupError::rollback_failed(id.as_str(), e.to_string()))?;
        self.clear_vault()
            .map_err(|e| BackupError::rollback_failed(id.as_str(), e.to_string()))?;
        let restored_files = copy_tree(&self.session_walker(id), &self.vault_root, &self.observer)
            .map_err(|e| BackupError::rollback_failed(id.as_str(), e.to_string()))?;

        if restored_files != expected_files {
            self.observer.error(
                COMPONENT,
                &format!(
                    "Rollback file count mismatch: restored {}, backup holds {}",
                    restored_files, expected_files
                ),
            );
        }

        let verified = match TreeDigest::compute(&self.vault_walker()) {
            Ok(actual) if actual == expected => {
                self.observer.info(
                    COMPONENT,
                    &format!(
                        "Rolled back to {} ({} files, sha256 {})",
                        id,
                        actual.files,
                        actual.short()
                    ),
                );
                true
            }
            Ok(actual) => {
                self.observer.error(
                    COMPONENT,
                    &format!(
                        "Restored vault digest {} differs from backup {} digest {}",
                        actual.short(),
                        id,
                        expected.short()
                    ),
                );
                false
            }
            Err(e) => {
                self.observer
                    .error(COMPONENT, &format!("Could not verify rollback: {}", e));
                false
            }
        };

        Ok(RollbackReport {
            session_id: id.clone(),
            emergency_backup,
            restored_files,
            expected_files,
            verified,
        })
    }

    /// Remove every non-excluded file and then any directory left empty
    fn clear_vault(&self) -> Result<()> {
        let mut entries = self.vault_walker().entries()?;
        // Deepest first so directories are empty when reached
        entries.sort_by_key(|e| std::cmp::Reverse(e.depth()));

        for entry in entries {
            let path = entry.path();
            let file_type = entry.file_type();
            if file_type.is_symlink() {
                continue;
            }
            if file_type.is_dir() {
                match fs::remove_dir(path) {
                    Ok(()) => {}
                    // Still holds excluded entries or symlinks
                    Err(e) if e.kind() == io::ErrorKind::DirectoryNotEmpty => {}
                    Err(e) => return Err(BackupError::storage(path, e)),
                }
            } else {
                fs::remove_file(path).map_err(|e| BackupError::storage(path, e))?;
            }
        }
        Ok(())
    }

    /// Sessions for this vault, newest first
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>> {
        let read_dir = match fs::read_dir(&self.backup_root) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(BackupError::storage(&self.backup_root, e)),
        };

        let mut sessions = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| BackupError::storage(&self.backup_root, e))?;
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if let Some((created_at, sequence)) = parse_session_name(&self.vault_name, &name) {
                let path = entry.path();
                let file_count = VaultWalker::for_tree(&path, ExcludeMatcher::default())
                    .files()?
                    .len();
                sessions.push(BackupInfo {
                    id: BackupSessionId::new(name),
                    path,
                    created_at,
                    sequence,
                    file_count,
                });
            }
        }

        sessions.sort_by(|a, b| (b.created_at, b.sequence).cmp(&(a.created_at, a.sequence)));
        Ok(sessions)
    }

    /// Delete one session
    pub fn delete_backup(&self, id: &BackupSessionId) -> Result<()> {
        let path = self.session_path(id);
        if !path.is_dir() {
            return Err(BackupError::session_not_found(id.as_str()));
        }
        fs::remove_dir_all(&path).map_err(|e| BackupError::storage(&path, e))?;
        self.observer
            .info(COMPONENT, &format!("Deleted backup {}", id));
        Ok(())
    }

    /// Keep the newest `keep` sessions and delete the rest.
    ///
    /// A dry run reports exactly the sessions a real run would delete.
    #[tracing::instrument(skip(self))]
    pub fn prune(&self, keep: usize, dry_run: bool) -> Result<PruneReport> {
        let sessions = self.list_backups()?;
        let split = keep.min(sessions.len());
        let (kept, doomed) = sessions.split_at(split);

        let mut deleted = Vec::with_capacity(doomed.len());
        for info in doomed {
            if dry_run {
                self.observer
                    .info(COMPONENT, &format!("Would delete backup {}", info.id));
            } else {
                self.delete_backup(&info.id)?;
            }
            deleted.push(info.id.clone());
        }

        Ok(PruneReport {
            kept: kept.iter().map(|i| i.id.clone()).collect(),
            deleted,
            dry_run,
        })
    }
}

/// Parse `<vault>-<YYYYMMDD-HHMMSS>[-NN]`
fn parse_session_name(vault_name: &str, name: &str) -> Option<(NaiveDateTime, u32)> {
    let rest = name.strip_prefix(vault_name)?.strip_prefix('-')?;
    let stamp = rest.get(..TIMESTAMP_LEN)?;
    let created = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
    let tail = &rest[TIMESTAMP_LEN..];
    let sequence = if tail.is_empty() {
        0
    } else {
        let digits = tail.strip_prefix('-')?;
        if digits.len() != 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()?
    };
    Some((created, sequence))
}

/// Copy every file `walker` visits into `dest`, mirroring directories.
///
/// Symlinks are skipped with a warning. Returns the number of files copied.
pub(crate) fn copy_tree(walker: &VaultWalker, dest: &Path, observer: &SharedObserver) -> Result<usize> {
    fs::create_dir_all(dest).map_err(|e| BackupError::storage(dest, e))?;
    let mut copied = 0;

    for entry in walker.entries()? {
        let relative = walker.relative(entry.path());
        let target = dest.join(&relative);
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            observer.warn(
                COMPONENT,
                &format!("Skipping symlink {}", relative.display()),
            );
        } else if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| BackupError::storage(&target, e))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| BackupError::storage(parent, e))?;
            }
            fs::copy(entry.path(), &target).map_err(|e| BackupError::storage(entry.path(), e))?;
            copied += 1;
        }
    }
    Ok(copied)
}
