//! Link-graph health summaries.

use refile_graph::LinkIndex;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;

const TOP_TARGETS: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct BrokenLink {
    pub file: PathBuf,
    pub target: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetCount {
    pub target: String,
    pub references: usize,
}

/// Snapshot of a [`LinkIndex`] suitable for reporting
#[derive(Debug, Clone, Serialize)]
pub struct LinkSummary {
    pub notes: usize,
    pub attachments: usize,
    pub total_links: usize,
    pub broken_links: usize,
    pub broken_ratio: f64,
    /// Most referenced targets, busiest first
    pub top_targets: Vec<TargetCount>,
    pub broken: Vec<BrokenLink>,
}

impl LinkSummary {
    pub fn from_index(index: &LinkIndex) -> Self {
        let mut top_targets: Vec<TargetCount> = index
            .targets()
            .map(|target| TargetCount {
                target: target.to_string(),
                references: index.referencing(target).len(),
            })
            .collect();
        top_targets.sort_by(|a, b| {
            b.references
                .cmp(&a.references)
                .then_with(|| a.target.cmp(&b.target))
        });
        top_targets.truncate(TOP_TARGETS);

        Self {
            notes: index.catalog().note_count(),
            attachments: index.catalog().attachment_count(),
            total_links: index.total_links(),
            broken_links: index.broken_count(),
            broken_ratio: index.broken_ratio(),
            top_targets,
            broken: index
                .broken_links()
                .map(|(file, target)| BrokenLink {
                    file: file.to_path_buf(),
                    target: target.to_string(),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Markdown rendering; `broken_only` drops the overview and top targets
    pub fn to_markdown(&self, broken_only: bool) -> String {
        let mut out = String::new();
        if !broken_only {
            out.push_str("# Link Graph\n\n");
            let _ = writeln!(
                out,
                "{} notes, {} attachments, {} links, {} broken ({:.1}%)",
                self.notes,
                self.attachments,
                self.total_links,
                self.broken_links,
                self.broken_ratio * 100.0
            );
            if !self.top_targets.is_empty() {
                out.push_str("\n## Most referenced\n\n| Target | Backlinks |\n|---|---:|\n");
                for entry in &self.top_targets {
                    let _ = writeln!(out, "| {} | {} |", entry.target, entry.references);
                }
            }
            out.push('\n');
        }

        out.push_str("## Broken links\n\n");
        if self.broken.is_empty() {
            out.push_str("None.\n");
        }
        for link in &self.broken {
            let _ = writeln!(out, "- `{}` → [[{}]]", link.file.display(), link.target);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refile_graph::NoteCatalog;
    use std::path::Path;

    fn summary() -> LinkSummary {
        let mut catalog = NoteCatalog::new();
        catalog.add_note(Path::new("a.md"));
        catalog.add_note(Path::new("b.md"));
        catalog.add_attachment(Path::new("pic.png"));
        let mut index = LinkIndex::new(catalog);
        index.add_note("a.md", "[[b]] [[ghost]] ![[pic.png]]");
        index.add_note("b.md", "[[a]] [[b]]");
        LinkSummary::from_index(&index)
    }

    #[test]
    fn test_counts_and_ranking() {
        let summary = summary();
        assert_eq!(summary.notes, 2);
        assert_eq!(summary.attachments, 1);
        assert_eq!(summary.total_links, 5);
        assert_eq!(summary.broken_links, 1);
        assert_eq!(summary.top_targets[0].target, "b");
        assert_eq!(summary.top_targets[0].references, 2);
        assert_eq!(summary.broken[0].target, "ghost");
    }

    #[test]
    fn test_broken_only_markdown() {
        let md = summary().to_markdown(true);
        assert!(md.starts_with("## Broken links"));
        assert!(md.contains("- `a.md` → [[ghost]]"));
        assert!(!md.contains("Most referenced"));
    }
}
