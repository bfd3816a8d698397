//! # Refile Vault
//!
//! Filesystem side of a reorganization:
//!
//! - [`VaultWalker`]: exclude-aware traversal that never follows symlinks
//! - [`BackupManager`]: timestamped whole-vault sessions, rollback with an
//!   emergency snapshot, retention pruning
//! - [`MediaLinkRewriter`]: keeps relative image/attachment links valid when a
//!   note changes directory
//!
//! ## Example
//!
//! ```no_run
//! use refile_core::prelude::*;
//! use refile_vault::BackupManager;
//!
//! # fn main() -> refile_core::Result<()> {
//! let config = ReorgConfig::builder("/data/vault", "/data/vault-backups").build()?;
//! let backups = BackupManager::new(&config, default_observer())?;
//!
//! let session = backups.create_backup()?;
//! // ... mutate the vault ...
//! backups.rollback(&session)?;
//! backups.prune(5, false)?;
//! # Ok(())
//! # }
//! ```

pub mod backup;
pub mod digest;
pub mod media;
pub mod walker;

pub use backup::{BackupInfo, BackupManager, PruneReport, RollbackReport};
pub use digest::TreeDigest;
pub use media::{MediaLinkRewriter, MediaRewrite, RelativeMediaRewriter};
pub use walker::{ExcludeMatcher, VaultWalker};
