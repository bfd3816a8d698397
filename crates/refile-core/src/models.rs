//! Core data models for reorganization planning and execution.
//!
//! These types are designed to be:
//! - **Serializable**: All types derive Serialize/Deserialize
//! - **Pure values**: a `MoveOperation` or `MovePlan` never touches the disk
//! - **Type-Safe**: `LinkForm` replaces loose "is this an embed/alias" checks

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Handle to a backup session, the session directory name under the backup root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackupSessionId(String);

impl BackupSessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackupSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BackupSessionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.contains(['/', '\\']) || trimmed == ".." {
            return Err(format!("Invalid backup session id '{}'", s));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// Byte range of a match inside the note content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shape of a wiki-link occurrence.
///
/// `[[T]]`, `[[T|alias]]`, `[[T#section]]` are `Standard`; the same forms
/// prefixed with `!` are `Embed`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkForm {
    Standard {
        section: Option<String>,
        alias: Option<String>,
    },
    Embed {
        section: Option<String>,
        alias: Option<String>,
    },
}

impl LinkForm {
    pub fn is_embed(&self) -> bool {
        matches!(self, Self::Embed { .. })
    }

    pub fn section(&self) -> Option<&str> {
        match self {
            Self::Standard { section, .. } | Self::Embed { section, .. } => section.as_deref(),
        }
    }

    pub fn alias(&self) -> Option<&str> {
        match self {
            Self::Standard { alias, .. } | Self::Embed { alias, .. } => alias.as_deref(),
        }
    }
}

/// One wiki-link occurrence inside a note
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WikiLink {
    /// Exact matched text, e.g. `![[Note#Intro|see intro]]`
    pub raw: String,
    /// Referenced note name as written, without section or alias
    pub target: String,
    pub form: LinkForm,
    /// 1-based line number
    pub line: usize,
    pub span: Span,
}

impl WikiLink {
    pub fn is_embed(&self) -> bool {
        self.form.is_embed()
    }

    /// Text shown to a reader: the alias when present, otherwise the target
    pub fn display(&self) -> &str {
        self.form.alias().unwrap_or(&self.target)
    }
}

/// A planned relocation. Paths are vault-relative.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveOperation {
    pub source: PathBuf,
    pub target: PathBuf,
    pub reason: String,
}

impl MoveOperation {
    pub fn new(
        source: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            reason: reason.into(),
        }
    }

    pub fn source_stem(&self) -> Option<&str> {
        file_stem(&self.source)
    }

    pub fn target_stem(&self) -> Option<&str> {
        file_stem(&self.target)
    }

    /// Whether references by name need rewriting after this move
    pub fn stem_changed(&self) -> bool {
        self.source_stem() != self.target_stem()
    }

    /// File name for progress reporting
    pub fn display_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }
}

fn file_stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}

/// A rewrite of one link occurrence in a referencing note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkUpdate {
    /// Vault-relative path of the note containing the link (pre-move location)
    pub file: PathBuf,
    pub old_link: WikiLink,
    pub new_target: String,
    pub new_text: String,
}

/// Aggregate counts carried by every plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStats {
    pub total_files: usize,
    pub files_with_metadata: usize,
    pub correctly_placed: usize,
    pub planned_moves: usize,
    pub conflicts: usize,
    pub unknown_types: usize,
    pub malformed_files: usize,
    pub link_updates: usize,
    pub broken_links: usize,
}

/// Dry-run output: everything that would change, and everything that cannot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovePlan {
    moves: Vec<MoveOperation>,
    conflicts: Vec<String>,
    unknown_types: Vec<PathBuf>,
    malformed_files: Vec<PathBuf>,
    link_updates: Vec<LinkUpdate>,
    stats: PlanStats,
}

impl MovePlan {
    /// Assemble a plan; derived counts in `stats` are filled in from the parts.
    pub fn from_parts(
        moves: Vec<MoveOperation>,
        conflicts: Vec<String>,
        unknown_types: Vec<PathBuf>,
        malformed_files: Vec<PathBuf>,
        mut stats: PlanStats,
    ) -> Self {
        stats.planned_moves = moves.len();
        stats.conflicts = conflicts.len();
        stats.unknown_types = unknown_types.len();
        stats.malformed_files = malformed_files.len();
        Self {
            moves,
            conflicts,
            unknown_types,
            malformed_files,
            link_updates: Vec::new(),
            stats,
        }
    }

    /// Attach link analysis, producing the final plan
    pub fn with_link_analysis(mut self, link_updates: Vec<LinkUpdate>, broken_links: usize) -> Self {
        self.stats.link_updates = link_updates.len();
        self.stats.broken_links = broken_links;
        self.link_updates = link_updates;
        self
    }

    pub fn moves(&self) -> &[MoveOperation] {
        &self.moves
    }

    pub fn conflicts(&self) -> &[String] {
        &self.conflicts
    }

    pub fn unknown_types(&self) -> &[PathBuf] {
        &self.unknown_types
    }

    pub fn malformed_files(&self) -> &[PathBuf] {
        &self.malformed_files
    }

    pub fn link_updates(&self) -> &[LinkUpdate] {
        &self.link_updates
    }

    pub fn stats(&self) -> &PlanStats {
        &self.stats
    }

    pub fn has_moves(&self) -> bool {
        !self.moves.is_empty()
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Outcome of a successful execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    /// Moves actually performed, in order
    pub moved: Vec<MoveOperation>,
    /// Sources that vanished between planning and execution
    pub skipped: Vec<PathBuf>,
    pub link_updates_applied: usize,
    pub media_links_rewritten: usize,
    /// Media rewrite failures (logged, never fatal)
    pub media_failures: Vec<String>,
    pub backup_session: Option<BackupSessionId>,
    /// Whether the backup session still exists on disk
    pub backup_retained: bool,
    pub transaction_id: String,
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Successful result for a plan with nothing to do
    pub fn noop(transaction_id: impl Into<String>) -> Self {
        Self {
            success: true,
            moved: Vec::new(),
            skipped: Vec::new(),
            link_updates_applied: 0,
            media_links_rewritten: 0,
            media_failures: Vec::new(),
            backup_session: None,
            backup_retained: false,
            transaction_id: transaction_id.into(),
            duration_ms: 0,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.moved.is_empty() && self.skipped.is_empty() && self.backup_session.is_none()
    }
}

/// A note that could not be read back during validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Post-execution integrity report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub validation_passed: bool,
    pub session_id: Option<BackupSessionId>,
    pub files_checked: usize,
    pub empty_files: Vec<PathBuf>,
    pub read_errors: Vec<ReadFailure>,
    pub total_links: usize,
    pub broken_links: usize,
    /// Broken links as a percentage of all links (0.0 when there are none)
    pub broken_link_percentage: f64,
    /// Note count in the referenced backup session, if one was given
    pub backup_file_count: Option<usize>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new(session_id: Option<BackupSessionId>) -> Self {
        Self {
            validation_passed: true,
            session_id,
            files_checked: 0,
            empty_files: Vec::new(),
            read_errors: Vec::new(),
            total_links: 0,
            broken_links: 0,
            broken_link_percentage: 0.0,
            backup_file_count: None,
            warnings: Vec::new(),
        }
    }

    /// Record an unreadable note; this fails the validation
    pub fn add_read_error(&mut self, path: impl Into<PathBuf>, reason: impl Into<String>) {
        self.read_errors.push(ReadFailure {
            path: path.into(),
            reason: reason.into(),
        });
        self.validation_passed = false;
    }

    /// Record an empty note; only a warning
    pub fn add_empty_file(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.warnings
            .push(format!("Note is empty: {}", path.display()));
        self.empty_files.push(path);
    }

    /// Set link counts and derive the broken percentage
    pub fn set_link_counts(&mut self, total: usize, broken: usize) {
        self.total_links = total;
        self.broken_links = broken;
        self.broken_link_percentage = if total == 0 {
            0.0
        } else {
            broken as f64 * 100.0 / total as f64
        };
    }
}
