//! Content digests for restore verification.

use crate::walker::VaultWalker;
use refile_core::{BackupError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;

/// SHA-256 over every file's relative path and content, in sorted order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeDigest {
    pub files: usize,
    pub sha256: String,
}

impl TreeDigest {
    /// Digest the files `walker` visits
    pub fn compute(walker: &VaultWalker) -> Result<Self> {
        let mut hasher = Sha256::new();
        let mut files = 0;

        for path in walker.files()? {
            let relative = walker.relative(&path);
            let content = fs::read(&path).map_err(|e| BackupError::storage(&path, e))?;

            // Separators keep ("ab","c") distinct from ("a","bc")
            hasher.update(relative.to_string_lossy().replace('\\', "/").as_bytes());
            hasher.update([0u8]);
            hasher.update((content.len() as u64).to_le_bytes());
            hasher.update(&content);
            files += 1;
        }

        Ok(Self {
            files,
            sha256: format!("{:x}", hasher.finalize()),
        })
    }

    /// Short prefix for log lines
    pub fn short(&self) -> &str {
        &self.sha256[..self.sha256.len().min(12)]
    }
}
