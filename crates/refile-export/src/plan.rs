//! Dry-run plan reports.

use chrono::Utc;
use refile_core::{MovePlan, PlanStats};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

/// Shown whenever a plan has pending moves
pub const SAFETY_NOTICE: &str = "No files were changed. Applying this plan takes a backup session \
first and rolls the vault back if any move or link rewrite fails.";

#[derive(Serialize)]
#[serde(tag = "record", rename_all = "snake_case")]
enum PlanRecord<'a> {
    Summary {
        generated_at: String,
        stats: &'a PlanStats,
    },
    Move {
        source: &'a Path,
        target: &'a Path,
        reason: &'a str,
    },
    Conflict {
        detail: &'a str,
    },
    Unknown {
        path: &'a Path,
    },
    Malformed {
        path: &'a Path,
    },
    LinkUpdate {
        file: &'a Path,
        line: usize,
        old: &'a str,
        new: &'a str,
    },
    Notice {
        message: &'a str,
    },
}

/// Renders a [`MovePlan`] for review before anything is applied
pub struct PlanReportExporter;

impl PlanReportExporter {
    /// One JSON object per line, each tagged with a `record` kind.
    ///
    /// The first line is always the `summary`; a trailing `notice` appears only
    /// when the plan has moves.
    pub fn to_json_lines(plan: &MovePlan) -> serde_json::Result<String> {
        let mut records = vec![PlanRecord::Summary {
            generated_at: Utc::now().to_rfc3339(),
            stats: plan.stats(),
        }];
        records.extend(plan.moves().iter().map(|op| PlanRecord::Move {
            source: op.source.as_path(),
            target: op.target.as_path(),
            reason: op.reason.as_str(),
        }));
        records.extend(
            plan.conflicts()
                .iter()
                .map(|c| PlanRecord::Conflict { detail: c.as_str() }),
        );
        records.extend(
            plan.unknown_types()
                .iter()
                .map(|p| PlanRecord::Unknown { path: p.as_path() }),
        );
        records.extend(
            plan.malformed_files()
                .iter()
                .map(|p| PlanRecord::Malformed { path: p.as_path() }),
        );
        records.extend(plan.link_updates().iter().map(|u| PlanRecord::LinkUpdate {
            file: u.file.as_path(),
            line: u.old_link.line,
            old: u.old_link.raw.as_str(),
            new: u.new_text.as_str(),
        }));
        if plan.has_moves() {
            records.push(PlanRecord::Notice {
                message: SAFETY_NOTICE,
            });
        }

        let mut out = String::new();
        for record in &records {
            out.push_str(&serde_json::to_string(record)?);
            out.push('\n');
        }
        Ok(out)
    }

    pub fn to_markdown(plan: &MovePlan) -> String {
        let stats = plan.stats();
        let mut out = String::new();

        out.push_str("# Reorganization Plan\n\n");
        let _ = writeln!(out, "Generated {}\n", Utc::now().to_rfc3339());

        out.push_str("| Metric | Count |\n|---|---:|\n");
        for (label, value) in [
            ("Notes scanned", stats.total_files),
            ("With metadata", stats.files_with_metadata),
            ("Correctly placed", stats.correctly_placed),
            ("Planned moves", stats.planned_moves),
            ("Conflicts", stats.conflicts),
            ("Unknown categories", stats.unknown_types),
            ("Malformed", stats.malformed_files),
            ("Link updates", stats.link_updates),
            ("Broken links", stats.broken_links),
        ] {
            let _ = writeln!(out, "| {} | {} |", label, value);
        }

        if plan.has_moves() {
            out.push_str("\n## Moves\n\n| Source | Target | Reason |\n|---|---|---|\n");
            for op in plan.moves() {
                let _ = writeln!(
                    out,
                    "| `{}` | `{}` | {} |",
                    op.source.display(),
                    op.target.display(),
                    op.reason
                );
            }
        }

        if plan.has_conflicts() {
            out.push_str("\n## Conflicts\n\n");
            for conflict in plan.conflicts() {
                let _ = writeln!(out, "- {}", conflict);
            }
        }

        path_section(&mut out, "Unknown categories", plan.unknown_types());
        path_section(&mut out, "Malformed notes", plan.malformed_files());

        if !plan.link_updates().is_empty() {
            out.push_str("\n## Link updates\n\n");
            for update in plan.link_updates() {
                let _ = writeln!(
                    out,
                    "- `{}` line {}: `{}` → `{}`",
                    update.file.display(),
                    update.old_link.line,
                    update.old_link.raw,
                    update.new_text
                );
            }
        }

        if plan.has_moves() {
            let _ = writeln!(out, "\n> **Dry run.** {}", SAFETY_NOTICE);
        } else {
            out.push_str("\nNothing to move.\n");
        }
        out
    }
}

fn path_section(out: &mut String, title: &str, paths: &[std::path::PathBuf]) {
    if paths.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n## {}\n", title);
    for path in paths {
        let _ = writeln!(out, "- `{}`", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refile_core::{LinkUpdate, MoveOperation};
    use refile_parser::parse_wikilinks;
    use std::path::PathBuf;

    fn sample_plan() -> MovePlan {
        let stats = PlanStats {
            total_files: 4,
            files_with_metadata: 3,
            correctly_placed: 1,
            ..Default::default()
        };
        let link = parse_wikilinks("see [[a|Alpha]]").remove(0);
        let update = LinkUpdate {
            file: PathBuf::from("b.md"),
            old_link: link,
            new_target: "alpha".to_string(),
            new_text: "[[alpha|Alpha]]".to_string(),
        };
        MovePlan::from_parts(
            vec![MoveOperation::new(
                "Inbox/a.md",
                "Permanent/alpha.md",
                "category 'permanent' belongs in Permanent",
            )],
            vec!["x.md -> Permanent/x.md: target already exists".to_string()],
            vec![PathBuf::from("odd.md")],
            Vec::new(),
            stats,
        )
        .with_link_analysis(vec![update], 2)
    }

    #[test]
    fn test_json_lines_records() {
        let out = PlanReportExporter::to_json_lines(&sample_plan()).unwrap();
        let records: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        let kinds: Vec<&str> = records
            .iter()
            .map(|r| r["record"].as_str().unwrap())
            .collect();
        assert_eq!(
            kinds,
            vec!["summary", "move", "conflict", "unknown", "link_update", "notice"]
        );
        assert_eq!(records[0]["stats"]["planned_moves"], 1);
        assert_eq!(records[0]["stats"]["broken_links"], 2);
        assert_eq!(records[1]["target"], "Permanent/alpha.md");
        assert_eq!(records[4]["new"], "[[alpha|Alpha]]");
    }

    #[test]
    fn test_empty_plan_has_no_notice() {
        let plan = MovePlan::default();
        let out = PlanReportExporter::to_json_lines(&plan).unwrap();
        assert_eq!(out.lines().count(), 1);
        assert!(!out.contains("notice"));

        let md = PlanReportExporter::to_markdown(&plan);
        assert!(md.contains("Nothing to move"));
        assert!(!md.contains(SAFETY_NOTICE));
    }

    #[test]
    fn test_markdown_sections() {
        let md = PlanReportExporter::to_markdown(&sample_plan());
        assert!(md.contains("| Planned moves | 1 |"));
        assert!(md.contains("## Conflicts"));
        assert!(md.contains("## Unknown categories"));
        assert!(!md.contains("## Malformed notes"));
        assert!(md.contains("`[[a|Alpha]]` → `[[alpha|Alpha]]`"));
        assert!(md.contains(SAFETY_NOTICE));
    }
}
