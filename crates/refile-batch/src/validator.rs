//! Post-execution integrity checks.

use refile_core::{
    BackupError, BackupSessionId, ReorgConfig, Result, SharedObserver, ValidationReport,
};
use refile_graph::LinkGraphScanner;
use refile_vault::{BackupManager, ExcludeMatcher, VaultWalker};
use std::fs;

const COMPONENT: &str = "validator";

/// Re-reads every note and re-runs the link scan
pub struct IntegrityValidator {
    config: ReorgConfig,
    observer: SharedObserver,
}

impl IntegrityValidator {
    pub fn new(config: &ReorgConfig, observer: SharedObserver) -> Self {
        Self {
            config: config.clone(),
            observer,
        }
    }

    /// Validate the vault as it is now.
    ///
    /// Fails only when the vault itself cannot be walked; unreadable notes are
    /// recorded in the report and mark it failed.
    #[tracing::instrument(skip(self))]
    pub fn validate(&self, session: Option<&BackupSessionId>) -> Result<ValidationReport> {
        let mut report = ValidationReport::new(session.cloned());
        let walker = VaultWalker::new(&self.config);

        for path in walker.notes()? {
            let relative = walker.relative(&path);
            report.files_checked += 1;
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    report.add_read_error(&relative, e.to_string());
                    continue;
                }
            };
            match String::from_utf8(bytes) {
                Ok(text) if text.trim().is_empty() => report.add_empty_file(&relative),
                Ok(_) => {}
                Err(_) => report.add_read_error(&relative, "not valid UTF-8 text"),
            }
        }

        let index = LinkGraphScanner::new(&self.config, self.observer.clone()).scan()?;
        report.set_link_counts(index.total_links(), index.broken_count());

        if let Some(id) = session {
            let backups = BackupManager::new(&self.config, self.observer.clone())?;
            let session_path = backups.session_path(id);
            if !session_path.is_dir() {
                return Err(BackupError::session_not_found(id.as_str()));
            }
            let backup_notes = VaultWalker::for_tree(&session_path, ExcludeMatcher::default())
                .files()?
                .into_iter()
                .filter(|p| self.config.is_note(p))
                .count();
            report.backup_file_count = Some(backup_notes);
            if backup_notes != report.files_checked {
                report.warnings.push(format!(
                    "Note count changed: backup {} has {}, vault has {}",
                    id, backup_notes, report.files_checked
                ));
            }
        }

        for warning in &report.warnings {
            self.observer.warn(COMPONENT, warning);
        }
        for failure in &report.read_errors {
            self.observer.error(
                COMPONENT,
                &format!("Unreadable note {}: {}", failure.path.display(), failure.reason),
            );
        }
        self.observer.info(
            COMPONENT,
            &format!(
                "Checked {} notes: {} read errors, {}/{} links broken ({:.1}%)",
                report.files_checked,
                report.read_errors.len(),
                report.broken_links,
                report.total_links,
                report.broken_link_percentage
            ),
        );
        Ok(report)
    }
}
