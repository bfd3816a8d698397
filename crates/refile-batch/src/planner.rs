//! Dry-run planning: which notes belong elsewhere, and what blocks them.

use refile_core::{
    MoveOperation, MovePlan, PathValidator, PlanStats, ReorgConfig, Result, SharedObserver,
};
use refile_parser::MetadataCodec;
use refile_vault::VaultWalker;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const COMPONENT: &str = "planner";

/// Derives moves from each note's `category` field. Never mutates the vault.
pub struct MovePlanner {
    config: ReorgConfig,
    observer: SharedObserver,
}

impl MovePlanner {
    pub fn new(config: &ReorgConfig, observer: SharedObserver) -> Self {
        Self {
            config: config.clone(),
            observer,
        }
    }

    /// Plan moves for every note. Link analysis is attached separately.
    #[tracing::instrument(skip(self), fields(vault = %self.config.vault_root.display()))]
    pub fn plan(&self) -> Result<MovePlan> {
        let walker = VaultWalker::new(&self.config);
        let notes = walker.notes()?;

        let mut stats = PlanStats {
            total_files: notes.len(),
            ..Default::default()
        };
        let mut moves = Vec::new();
        let mut conflicts = Vec::new();
        let mut unknown_types = Vec::new();
        let mut malformed = Vec::new();
        let mut claimed: HashSet<PathBuf> = HashSet::new();

        for path in &notes {
            let relative = walker.relative(path);
            let content = match fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) => {
                    self.observer.warn(
                        COMPONENT,
                        &format!("Cannot read {}: {}", relative.display(), e),
                    );
                    malformed.push(relative);
                    continue;
                }
            };

            let note = MetadataCodec::parse(&content);
            if note.has_block {
                stats.files_with_metadata += 1;
            }
            let Some(category) = note.metadata.category().filter(|_| note.has_block) else {
                self.observer.debug(
                    COMPONENT,
                    &format!("No usable category in {}", relative.display()),
                );
                malformed.push(relative);
                continue;
            };

            let Some(directory) = self.config.directory_for(&category) else {
                self.observer.debug(
                    COMPONENT,
                    &format!("Unknown category '{}' in {}", category, relative.display()),
                );
                unknown_types.push(relative);
                continue;
            };
            let directory = PathValidator::normalize(Path::new(directory));

            let current_dir = relative.parent().unwrap_or(Path::new(""));
            if current_dir == directory {
                stats.correctly_placed += 1;
                continue;
            }

            let Some(file_name) = relative.file_name() else {
                continue;
            };
            let target = directory.join(file_name);

            // Any entry counts, including a dangling symlink
            if fs::symlink_metadata(self.config.vault_root.join(&target)).is_ok() {
                conflicts.push(format!(
                    "{} -> {}: target already exists",
                    relative.display(),
                    target.display()
                ));
                continue;
            }
            if !claimed.insert(target.clone()) {
                conflicts.push(format!(
                    "{} -> {}: target claimed by another planned move",
                    relative.display(),
                    target.display()
                ));
                continue;
            }

            let reason = format!("category '{}' belongs in {}", category, directory.display());
            moves.push(MoveOperation::new(relative, target, reason));
        }

        let plan = MovePlan::from_parts(moves, conflicts, unknown_types, malformed, stats);
        self.observer.info(
            COMPONENT,
            &format!(
                "Planned {} moves ({} conflicts, {} unknown categories, {} malformed)",
                plan.stats().planned_moves,
                plan.stats().conflicts,
                plan.stats().unknown_types,
                plan.stats().malformed_files
            ),
        );
        Ok(plan)
    }
}
