//! Execution summaries and validation reports, as Markdown or timestamped JSON.

use chrono::Utc;
use refile_core::{ExecutionResult, ValidationReport};
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Serialize)]
struct Stamped<'a, T: Serialize> {
    generated_at: String,
    #[serde(flatten)]
    body: &'a T,
}

fn stamped_json<T: Serialize>(body: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&Stamped {
        generated_at: Utc::now().to_rfc3339(),
        body,
    })
}

/// Export of an [`ExecutionResult`]
pub struct ExecutionExporter;

impl ExecutionExporter {
    pub fn to_json(result: &ExecutionResult) -> serde_json::Result<String> {
        stamped_json(result)
    }

    /// Short plain-text summary for terminals
    pub fn summary(result: &ExecutionResult) -> String {
        if result.is_noop() {
            return "Nothing to move.".to_string();
        }
        let mut out = format!(
            "Moved {} note(s), rewrote {} wiki link(s) and {} media link(s) in {} ms",
            result.moved.len(),
            result.link_updates_applied,
            result.media_links_rewritten,
            result.duration_ms
        );
        if !result.skipped.is_empty() {
            let _ = write!(out, "\nSkipped {} vanished source(s)", result.skipped.len());
        }
        if !result.media_failures.is_empty() {
            let _ = write!(
                out,
                "\n{} media link(s) could not be rewritten",
                result.media_failures.len()
            );
        }
        match (&result.backup_session, result.backup_retained) {
            (Some(id), true) => {
                let _ = write!(out, "\nBackup retained: {}", id);
            }
            (Some(id), false) => {
                let _ = write!(out, "\nBackup {} removed after success", id);
            }
            (None, _) => out.push_str("\nNo backup was taken"),
        }
        out
    }
}

/// Export of a [`ValidationReport`]
pub struct ValidationExporter;

impl ValidationExporter {
    pub fn to_json(report: &ValidationReport) -> serde_json::Result<String> {
        stamped_json(report)
    }

    pub fn to_markdown(report: &ValidationReport) -> String {
        let mut out = String::from("# Validation Report\n\n");
        let verdict = if report.validation_passed {
            "PASSED"
        } else {
            "FAILED"
        };
        let _ = writeln!(out, "**Status:** {}\n", verdict);
        if let Some(id) = &report.session_id {
            let _ = writeln!(out, "Compared against backup `{}`\n", id);
        }

        out.push_str("| Metric | Value |\n|---|---:|\n");
        let _ = writeln!(out, "| Notes checked | {} |", report.files_checked);
        let _ = writeln!(out, "| Read errors | {} |", report.read_errors.len());
        let _ = writeln!(out, "| Empty notes | {} |", report.empty_files.len());
        let _ = writeln!(out, "| Links | {} |", report.total_links);
        let _ = writeln!(
            out,
            "| Broken links | {} ({:.1}%) |",
            report.broken_links, report.broken_link_percentage
        );
        if let Some(count) = report.backup_file_count {
            let _ = writeln!(out, "| Notes in backup | {} |", count);
        }

        if !report.read_errors.is_empty() {
            out.push_str("\n## Read errors\n\n");
            for failure in &report.read_errors {
                let _ = writeln!(out, "- `{}`: {}", failure.path.display(), failure.reason);
            }
        }
        if !report.empty_files.is_empty() {
            out.push_str("\n## Empty notes\n\n");
            for path in &report.empty_files {
                let _ = writeln!(out, "- `{}`", path.display());
            }
        }
        if !report.warnings.is_empty() {
            out.push_str("\n## Warnings\n\n");
            for warning in &report.warnings {
                let _ = writeln!(out, "- {}", warning);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refile_core::{BackupSessionId, MoveOperation};

    #[test]
    fn test_validation_markdown_failed() {
        let mut report = ValidationReport::new(Some(BackupSessionId::new("vault-20260101-120000")));
        report.files_checked = 3;
        report.add_read_error("bad.md", "not valid UTF-8 text");
        report.set_link_counts(4, 1);

        let md = ValidationExporter::to_markdown(&report);
        assert!(md.contains("**Status:** FAILED"));
        assert!(md.contains("`vault-20260101-120000`"));
        assert!(md.contains("| Broken links | 1 (25.0%) |"));
        assert!(md.contains("- `bad.md`: not valid UTF-8 text"));
    }

    #[test]
    fn test_validation_json_is_flat() {
        let report = ValidationReport::new(None);
        let json: serde_json::Value =
            serde_json::from_str(&ValidationExporter::to_json(&report).unwrap()).unwrap();
        assert!(json["generated_at"].is_string());
        assert_eq!(json["validation_passed"], true);
        assert_eq!(json["files_checked"], 0);
    }

    #[test]
    fn test_execution_summary() {
        let noop = ExecutionResult::noop("tx");
        assert_eq!(ExecutionExporter::summary(&noop), "Nothing to move.");

        let mut result = ExecutionResult::noop("tx");
        result.moved.push(MoveOperation::new("Inbox/a.md", "Permanent/a.md", "r"));
        result.backup_session = Some(BackupSessionId::new("v-20260101-000000"));
        result.backup_retained = true;
        let summary = ExecutionExporter::summary(&result);
        assert!(summary.starts_with("Moved 1 note(s)"));
        assert!(summary.contains("Backup retained: v-20260101-000000"));

        let json = ExecutionExporter::to_json(&result).unwrap();
        assert!(json.contains("\"transaction_id\": \"tx\""));
    }
}
