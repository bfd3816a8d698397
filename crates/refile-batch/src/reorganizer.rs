//! One-stop facade over planning, execution, validation and backups.

use crate::executor::{ExecuteOptions, MoveExecutor, ProgressFn};
use crate::links::LinkUpdatePlanner;
use crate::planner::MovePlanner;
use crate::validator::IntegrityValidator;
use refile_core::{
    BackupSessionId, ExecutionResult, MovePlan, ReorgConfig, Result, SharedObserver,
    ValidationReport,
};
use refile_graph::{LinkGraphScanner, LinkIndex};
use refile_vault::{BackupManager, RollbackReport};
use serde::{Deserialize, Serialize};

const COMPONENT: &str = "reorganizer";

/// Result of `apply_and_validate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyOutcome {
    pub execution: ExecutionResult,
    pub validation: ValidationReport,
    /// Present when validation failed and the vault was restored
    pub rollback: Option<RollbackReport>,
}

impl ApplyOutcome {
    /// Executed, validated and not rolled back
    pub fn succeeded(&self) -> bool {
        self.execution.success && self.validation.validation_passed && self.rollback.is_none()
    }
}

/// Entry point tying every component to one configuration and observer
pub struct Reorganizer {
    config: ReorgConfig,
    observer: SharedObserver,
    backups: BackupManager,
}

impl Reorganizer {
    /// Validates the configuration, including the backup-root nesting check
    pub fn new(config: ReorgConfig, observer: SharedObserver) -> Result<Self> {
        config.validate()?;
        let backups = BackupManager::new(&config, observer.clone())?;
        Ok(Self {
            config,
            observer,
            backups,
        })
    }

    pub fn config(&self) -> &ReorgConfig {
        &self.config
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    pub fn scan_links(&self) -> Result<LinkIndex> {
        LinkGraphScanner::new(&self.config, self.observer.clone()).scan()
    }

    /// Full dry run: moves, conflicts, and the link rewrites the moves imply
    #[tracing::instrument(skip(self))]
    pub fn plan(&self) -> Result<MovePlan> {
        let plan = MovePlanner::new(&self.config, self.observer.clone()).plan()?;
        let index = self.scan_links()?;
        let updates = LinkUpdatePlanner::plan_link_updates(plan.moves(), &index);
        Ok(plan.with_link_analysis(updates, index.broken_count()))
    }

    pub fn execute(
        &self,
        plan: &MovePlan,
        options: ExecuteOptions,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<ExecutionResult> {
        MoveExecutor::new(&self.config, self.observer.clone())?.execute(plan, options, progress)
    }

    pub fn validate(&self, session: Option<&BackupSessionId>) -> Result<ValidationReport> {
        IntegrityValidator::new(&self.config, self.observer.clone()).validate(session)
    }

    /// Plan, execute, then validate.
    ///
    /// The backup session is held until validation passes. With `auto_rollback`
    /// a failed validation restores the vault from it.
    #[tracing::instrument(skip(self, progress))]
    pub fn apply_and_validate(
        &self,
        options: ExecuteOptions,
        auto_rollback: bool,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<ApplyOutcome> {
        let plan = self.plan()?;
        let mut execution = MoveExecutor::new(&self.config, self.observer.clone())?
            .retain_backup(true)
            .execute(&plan, options, progress)?;

        let session = execution.backup_session.clone();
        let validation = self.validate(session.as_ref())?;

        let mut rollback = None;
        if let Some(id) = &session {
            if !validation.validation_passed && auto_rollback {
                self.observer.warn(
                    COMPONENT,
                    &format!("Validation failed, rolling back to {}", id),
                );
                rollback = Some(self.backups.rollback(id)?);
            } else if validation.validation_passed && !self.config.keep_backup_on_success {
                self.backups.delete_backup(id)?;
                execution.backup_retained = false;
            }
        }

        Ok(ApplyOutcome {
            execution,
            validation,
            rollback,
        })
    }
}
