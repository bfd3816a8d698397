//! Builds a [`LinkIndex`] from the notes on disk.

use crate::catalog::NoteCatalog;
use crate::index::LinkIndex;
use refile_core::{ReorgConfig, Result, SharedObserver};
use refile_vault::VaultWalker;
use std::fs;

const COMPONENT: &str = "scanner";

/// Walks a vault and indexes every wiki-link in every note
pub struct LinkGraphScanner {
    config: ReorgConfig,
    observer: SharedObserver,
}

impl LinkGraphScanner {
    pub fn new(config: &ReorgConfig, observer: SharedObserver) -> Self {
        Self {
            config: config.clone(),
            observer,
        }
    }

    /// Scan the vault. Unreadable notes are reported and skipped.
    #[tracing::instrument(skip(self), fields(vault = %self.config.vault_root.display()))]
    pub fn scan(&self) -> Result<LinkIndex> {
        let walker = VaultWalker::new(&self.config);
        let files = walker.files()?;

        let mut catalog = NoteCatalog::with_extensions(self.config.note_extensions.clone());
        let mut notes = Vec::new();
        for path in files {
            if self.config.is_note(&path) {
                catalog.add_note(&path);
                notes.push(path);
            } else {
                catalog.add_attachment(&path);
            }
        }

        let mut index = LinkIndex::new(catalog);
        let mut skipped = 0;
        for path in &notes {
            let relative = walker.relative(path);
            match fs::read_to_string(path) {
                Ok(content) => index.add_note(relative, &content),
                Err(e) => {
                    skipped += 1;
                    self.observer.warn(
                        COMPONENT,
                        &format!("Skipping unreadable note {}: {}", relative.display(), e),
                    );
                }
            }
        }

        self.observer.info(
            COMPONENT,
            &format!(
                "Indexed {} links across {} notes ({} broken, {} skipped)",
                index.total_links(),
                index.file_count(),
                index.broken_count(),
                skipped
            ),
        );
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refile_core::RecordingObserver;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_scan_vault() {
        let temp = TempDir::new().unwrap();
        let vault = temp.path().join("vault");
        fs::create_dir_all(vault.join("Inbox")).unwrap();
        fs::create_dir_all(vault.join("assets")).unwrap();
        fs::create_dir_all(vault.join(".obsidian")).unwrap();
        fs::write(vault.join("Inbox/a.md"), "[[b]] ![[chart.png]] [[nowhere]]").unwrap();
        fs::write(vault.join("b.md"), "back to [[a]]").unwrap();
        fs::write(vault.join("assets/chart.png"), "png").unwrap();
        fs::write(vault.join(".obsidian/ignored.md"), "[[a]]").unwrap();
        // Invalid UTF-8 cannot be read as text
        fs::write(vault.join("Inbox/binary.md"), [0xff, 0xfe, 0x00]).unwrap();

        let config = ReorgConfig::builder(&vault, temp.path().join("backups"))
            .build()
            .unwrap();
        let observer = Arc::new(RecordingObserver::new());
        let index = LinkGraphScanner::new(&config, observer.clone())
            .scan()
            .unwrap();

        assert_eq!(index.file_count(), 2);
        assert_eq!(index.total_links(), 4);
        assert_eq!(index.broken_count(), 1);
        assert_eq!(index.referencing("a"), vec![Path::new("b.md")]);
        assert!(observer.contains("Skipping unreadable note"));
    }

    #[test]
    fn test_scan_text_vault() {
        let temp = TempDir::new().unwrap();
        let vault = temp.path().join("vault");
        fs::create_dir_all(&vault).unwrap();
        fs::write(vault.join("foo.txt"), "plain note").unwrap();
        fs::write(vault.join("bar.txt"), "see [[foo.txt]] and [[foo]]").unwrap();

        let config = ReorgConfig::builder(&vault, temp.path().join("backups"))
            .note_extensions(vec!["txt".to_string()])
            .build()
            .unwrap();
        let index = LinkGraphScanner::new(&config, Arc::new(RecordingObserver::new()))
            .scan()
            .unwrap();

        assert_eq!(index.total_links(), 2);
        assert_eq!(index.broken_count(), 0);
        assert_eq!(index.referencing("foo"), vec![Path::new("bar.txt")]);
    }
}
