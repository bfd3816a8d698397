//! Applies a `MovePlan` inside a backup/rollback envelope.
//!
//! The vault ends up either fully reorganized or restored from the session
//! taken at the start of execution.

use crate::planner::MovePlanner;
use refile_core::{
    BackupError, BackupSessionId, ExecutionResult, MoveOperation, MovePlan, ReorgConfig, Result,
    SharedObserver, TransactionBuilder,
};
use refile_parser::parse_wikilinks;
use refile_vault::{BackupManager, MediaLinkRewriter, RelativeMediaRewriter};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

const COMPONENT: &str = "executor";

/// Progress callback: `(completed, total, file name)`
pub type ProgressFn<'a> = &'a mut dyn FnMut(usize, usize, &str);

/// Execution switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteOptions {
    /// Snapshot the vault before the first move
    pub create_backup: bool,
    /// Re-plan and refuse to run if any conflict exists now
    pub validate_first: bool,
    /// Restore the snapshot when any step fails
    pub rollback_on_error: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            create_backup: true,
            validate_first: true,
            rollback_on_error: true,
        }
    }
}

/// Performs moves, media and link rewrites
pub struct MoveExecutor {
    config: ReorgConfig,
    backups: BackupManager,
    media: Box<dyn MediaLinkRewriter>,
    retain_backup: bool,
    observer: SharedObserver,
}

impl MoveExecutor {
    pub fn new(config: &ReorgConfig, observer: SharedObserver) -> Result<Self> {
        let backups = BackupManager::new(config, observer.clone())?;
        let media = RelativeMediaRewriter::new(&config.vault_root, config.note_extensions.clone());
        Ok(Self {
            config: config.clone(),
            backups,
            media: Box::new(media),
            retain_backup: config.keep_backup_on_success,
            observer,
        })
    }

    /// Replace the media link rewriter
    pub fn with_media_rewriter(mut self, media: Box<dyn MediaLinkRewriter>) -> Self {
        self.media = media;
        self
    }

    /// Keep the backup session after success regardless of configuration
    pub fn retain_backup(mut self, retain: bool) -> Self {
        self.retain_backup = retain;
        self
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Execute `plan`.
    ///
    /// Errors after the backup was taken trigger a rollback when
    /// `rollback_on_error` is set; the session is kept either way.
    #[tracing::instrument(skip_all, fields(moves = plan.moves().len()))]
    pub fn execute(
        &self,
        plan: &MovePlan,
        options: ExecuteOptions,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<ExecutionResult> {
        let transaction = TransactionBuilder::new();

        if options.validate_first {
            let fresh = MovePlanner::new(&self.config, self.observer.clone()).plan()?;
            if fresh.has_conflicts() {
                return Err(BackupError::Conflicts {
                    conflicts: fresh.conflicts().to_vec(),
                });
            }
        }

        if !plan.has_moves() {
            self.observer.info(COMPONENT, "Nothing to move");
            let mut result = ExecutionResult::noop(transaction.transaction_id());
            result.duration_ms = transaction.elapsed_ms();
            return Ok(result);
        }

        let session = if options.create_backup {
            Some(self.backups.create_backup()?)
        } else {
            None
        };

        let mut result = ExecutionResult::noop(transaction.transaction_id());
        result.backup_session = session.clone();
        result.backup_retained = session.is_some();

        if let Err(error) = self.apply(plan, &mut result, progress) {
            self.observer.error(
                COMPONENT,
                &format!("Execution failed after {} moves: {}", result.moved.len(), error),
            );
            return Err(self.recover(session.as_ref(), options, error));
        }

        if let Some(id) = &session
            && !self.retain_backup
        {
            match self.backups.delete_backup(id) {
                Ok(()) => result.backup_retained = false,
                Err(e) => self.observer.warn(
                    COMPONENT,
                    &format!("Could not remove backup {} after success: {}", id, e),
                ),
            }
        }

        result.success = true;
        result.duration_ms = transaction.elapsed_ms();
        self.observer.info(
            COMPONENT,
            &format!(
                "Moved {} notes, skipped {}, rewrote {} links ({} ms)",
                result.moved.len(),
                result.skipped.len(),
                result.link_updates_applied,
                result.duration_ms
            ),
        );
        Ok(result)
    }

    /// Roll back if possible; always hand back an error describing what happened
    fn recover(
        &self,
        session: Option<&BackupSessionId>,
        options: ExecuteOptions,
        error: BackupError,
    ) -> BackupError {
        let Some(id) = session.filter(|_| options.rollback_on_error) else {
            return error;
        };
        match self.backups.rollback(id) {
            Ok(report) => {
                self.observer.info(
                    COMPONENT,
                    &format!(
                        "Rolled back to {} ({} files restored)",
                        id, report.restored_files
                    ),
                );
                error
            }
            Err(rollback_error) => BackupError::rollback_failed(
                id.as_str(),
                format!("{} (while recovering from: {})", rollback_error, error),
            ),
        }
    }

    fn apply(
        &self,
        plan: &MovePlan,
        result: &mut ExecutionResult,
        mut progress: Option<ProgressFn<'_>>,
    ) -> Result<()> {
        let root = &self.config.vault_root;
        let total = plan.moves().len();

        for (index, op) in plan.moves().iter().enumerate() {
            let source = root.join(&op.source);
            let target = root.join(&op.target);

            if !source.exists() {
                self.observer.warn(
                    COMPONENT,
                    &format!("Source vanished since planning: {}", op.source.display()),
                );
                result.skipped.push(op.source.clone());
            } else {
                if fs::symlink_metadata(&target).is_ok() {
                    return Err(BackupError::target_exists(&op.source, &op.target));
                }
                self.rewrite_media(&source, &op.source, &op.target, result);

                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).map_err(|e| {
                        BackupError::move_failed(&op.source, &op.target, e.to_string())
                    })?;
                }
                fs::rename(&source, &target).map_err(|e| {
                    BackupError::move_failed(&op.source, &op.target, e.to_string())
                })?;
                self.observer.debug(
                    COMPONENT,
                    &format!("Moved {} -> {}", op.source.display(), op.target.display()),
                );
                result.moved.push(op.clone());
            }

            if let Some(callback) = progress.as_deref_mut() {
                callback(index + 1, total, &op.display_name());
            }
        }

        result.link_updates_applied = self.apply_link_updates(plan, &result.moved)?;
        Ok(())
    }

    /// Media rewriting never fails the execution
    fn rewrite_media(
        &self,
        absolute: &Path,
        from: &Path,
        to: &Path,
        result: &mut ExecutionResult,
    ) {
        let mut failures = Vec::new();
        match fs::read_to_string(absolute) {
            Err(e) => failures.push(format!(
                "{}: cannot read for media rewrite: {}",
                from.display(),
                e
            )),
            Ok(content) => match self.media.rewrite(&content, from, to) {
                Ok(rewrite) => {
                    failures.extend(rewrite.failures);
                    if rewrite.rewritten > 0 {
                        match fs::write(absolute, &rewrite.content) {
                            Ok(()) => result.media_links_rewritten += rewrite.rewritten,
                            Err(e) => failures.push(format!(
                                "{}: cannot write rewritten media links: {}",
                                from.display(),
                                e
                            )),
                        }
                    }
                }
                Err(e) => failures.push(format!("{}: media rewrite failed: {}", from.display(), e)),
            },
        }

        for failure in failures {
            self.observer.warn(COMPONENT, &failure);
            result.media_failures.push(failure);
        }
    }

    /// Apply the plan's link updates, following referencing files that moved
    fn apply_link_updates(
        &self,
        plan: &MovePlan,
        moved: &[MoveOperation],
    ) -> Result<usize> {
        if plan.link_updates().is_empty() {
            return Ok(0);
        }

        let relocated: HashMap<&Path, &Path> = moved
            .iter()
            .map(|op| (op.source.as_path(), op.target.as_path()))
            .collect();

        // file -> raw link text -> replacement
        let mut by_file: BTreeMap<&Path, HashMap<&str, &str>> = BTreeMap::new();
        for update in plan.link_updates() {
            by_file
                .entry(update.file.as_path())
                .or_default()
                .insert(update.old_link.raw.as_str(), update.new_text.as_str());
        }

        let mut applied = 0;
        for (file, replacements) in by_file {
            let current: PathBuf = relocated.get(file).copied().unwrap_or(file).to_path_buf();
            let absolute = self.config.vault_root.join(&current);
            if !absolute.exists() {
                self.observer.warn(
                    COMPONENT,
                    &format!("Referencing note vanished: {}", current.display()),
                );
                continue;
            }

            let content =
                fs::read_to_string(&absolute).map_err(|e| BackupError::storage(&absolute, e))?;
            let mut updated = content.clone();
            let mut count = 0;
            // Back to front so earlier spans stay valid
            for link in parse_wikilinks(&content).iter().rev() {
                if let Some(new_text) = replacements.get(link.raw.as_str()) {
                    updated.replace_range(link.span.start..link.span.end, new_text);
                    count += 1;
                }
            }

            if count > 0 {
                fs::write(&absolute, updated).map_err(|e| BackupError::storage(&absolute, e))?;
                self.observer.debug(
                    COMPONENT,
                    &format!("Rewrote {} links in {}", count, current.display()),
                );
                applied += count;
            }
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refile_core::{LinkUpdate, PlanStats, RecordingObserver};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        temp: TempDir,
        config: ReorgConfig,
        observer: Arc<RecordingObserver>,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let vault = temp.path().join("vault");
            fs::create_dir_all(vault.join("Inbox")).unwrap();
            let config = ReorgConfig::builder(&vault, temp.path().join("backups"))
                .build()
                .unwrap();
            Self {
                temp,
                config,
                observer: Arc::new(RecordingObserver::new()),
            }
        }

        fn vault(&self) -> &Path {
            &self.config.vault_root
        }

        fn write(&self, relative: &str, content: &str) {
            let path = self.vault().join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        fn executor(&self) -> MoveExecutor {
            MoveExecutor::new(&self.config, self.observer.clone()).unwrap()
        }

        fn sessions(&self) -> usize {
            fs::read_dir(self.temp.path().join("backups"))
                .map(|d| d.count())
                .unwrap_or(0)
        }
    }

    fn plan_of(moves: Vec<MoveOperation>) -> MovePlan {
        MovePlan::from_parts(moves, Vec::new(), Vec::new(), Vec::new(), PlanStats::default())
    }

    #[test]
    fn test_empty_plan_is_noop_without_backup() {
        let fx = Fixture::new();
        let result = fx
            .executor()
            .execute(&plan_of(Vec::new()), ExecuteOptions::default(), None)
            .unwrap();
        assert!(result.success);
        assert!(result.is_noop());
        assert_eq!(fx.sessions(), 0);
    }

    #[test]
    fn test_moves_with_progress_and_cleanup() {
        let fx = Fixture::new();
        fx.write("Inbox/a.md", "---\ncategory: permanent\n---\nA");
        let plan = plan_of(vec![
            MoveOperation::new("Inbox/a.md", "Permanent/a.md", "category"),
            MoveOperation::new("Inbox/gone.md", "Permanent/gone.md", "category"),
        ]);

        let mut seen = Vec::new();
        let mut progress = |done: usize, total: usize, name: &str| {
            seen.push(format!("{}/{} {}", done, total, name));
        };
        let options = ExecuteOptions {
            validate_first: false,
            ..Default::default()
        };
        let result = fx
            .executor()
            .execute(&plan, options, Some(&mut progress))
            .unwrap();

        assert!(result.success);
        assert_eq!(result.moved.len(), 1);
        assert_eq!(result.skipped, vec![PathBuf::from("Inbox/gone.md")]);
        assert!(fx.vault().join("Permanent/a.md").exists());
        assert_eq!(seen, vec!["1/2 a.md", "2/2 gone.md"]);
        // Session removed after success
        assert!(result.backup_session.is_some());
        assert!(!result.backup_retained);
        assert_eq!(fx.sessions(), 0);
    }

    #[test]
    fn test_validate_first_refuses_conflicts() {
        let fx = Fixture::new();
        fx.write("Inbox/a.md", "---\ncategory: permanent\n---\n");
        fx.write("Permanent/a.md", "occupied");
        let plan = plan_of(vec![MoveOperation::new(
            "Inbox/a.md",
            "Permanent/a.md",
            "category",
        )]);

        let result = fx.executor().execute(&plan, ExecuteOptions::default(), None);
        assert!(matches!(result, Err(BackupError::Conflicts { .. })));
        assert_eq!(fx.sessions(), 0);
    }

    #[test]
    fn test_target_exists_without_rollback_keeps_session() {
        let fx = Fixture::new();
        fx.write("Inbox/a.md", "a");
        fx.write("Inbox/b.md", "b");
        fx.write("Permanent/b.md", "occupied");
        let plan = plan_of(vec![
            MoveOperation::new("Inbox/a.md", "Permanent/a.md", "category"),
            MoveOperation::new("Inbox/b.md", "Permanent/b.md", "category"),
        ]);
        let options = ExecuteOptions {
            validate_first: false,
            rollback_on_error: false,
            ..Default::default()
        };

        let result = fx.executor().execute(&plan, options, None);
        assert!(matches!(result, Err(BackupError::TargetExists { .. })));
        // First move stays applied, the session is retained for manual recovery
        assert!(fx.vault().join("Permanent/a.md").exists());
        assert_eq!(fx.sessions(), 1);
    }

    #[test]
    fn test_link_updates_follow_moved_files() {
        let fx = Fixture::new();
        fx.write("Inbox/old name.md", "body");
        fx.write("Inbox/ref.md", "see [[old name|it]] and [[old name]] but `[[old name]]`");

        let moves = vec![
            MoveOperation::new("Inbox/old name.md", "Permanent/new name.md", "rename"),
            MoveOperation::new("Inbox/ref.md", "Literature/ref.md", "category"),
        ];
        let links = parse_wikilinks("see [[old name|it]] and [[old name]]");
        let updates = links
            .iter()
            .map(|link| LinkUpdate {
                file: PathBuf::from("Inbox/ref.md"),
                old_link: link.clone(),
                new_target: "new name".to_string(),
                new_text: refile_parser::render_wikilink(link, "new name"),
            })
            .collect();
        let plan = plan_of(moves).with_link_analysis(updates, 0);
        let options = ExecuteOptions {
            validate_first: false,
            ..Default::default()
        };

        let result = fx.executor().execute(&plan, options, None).unwrap();
        assert_eq!(result.link_updates_applied, 2);
        assert_eq!(
            fs::read_to_string(fx.vault().join("Literature/ref.md")).unwrap(),
            "see [[new name|it]] and [[new name]] but `[[old name]]`"
        );
    }
}
