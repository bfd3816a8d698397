//! Link rewrites implied by a set of moves.

use refile_core::{LinkUpdate, MoveOperation};
use refile_graph::LinkIndex;
use refile_parser::render_wikilink;

/// Computes `LinkUpdate`s from moves and a link index. Pure.
pub struct LinkUpdatePlanner;

impl LinkUpdatePlanner {
    /// One update per link occurrence that names a moved note whose stem changed.
    ///
    /// Moves that keep the file name need nothing: links resolve by name.
    pub fn plan_link_updates(moves: &[MoveOperation], index: &LinkIndex) -> Vec<LinkUpdate> {
        let mut updates = Vec::new();

        for op in moves.iter().filter(|op| op.stem_changed()) {
            let (Some(old_stem), Some(new_stem)) = (op.source_stem(), op.target_stem()) else {
                continue;
            };
            let old_key = index.catalog().normalize(old_stem);

            // Targets spelled without a timestamp prefix still resolve to the old stem
            let keys: Vec<&str> = index
                .targets()
                .filter(|key| {
                    *key == old_key || index.catalog().resolve(key) == Some(old_key.as_str())
                })
                .collect();

            for key in keys {
                for file in index.referencing(key) {
                    for link in index.links_in(file) {
                        if index.catalog().normalize(&link.target) != key {
                            continue;
                        }
                        updates.push(LinkUpdate {
                            file: file.to_path_buf(),
                            old_link: link.clone(),
                            new_target: new_stem.to_string(),
                            new_text: render_wikilink(link, new_stem),
                        });
                    }
                }
            }
        }

        updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refile_graph::NoteCatalog;
    use std::path::Path;

    fn index() -> LinkIndex {
        let mut catalog = NoteCatalog::new();
        for note in ["Inbox/draft.md", "Inbox/journal.md", "Inbox/202401011200 seed.md"] {
            catalog.add_note(Path::new(note));
        }
        let mut index = LinkIndex::new(catalog);
        index.add_note(
            "Inbox/journal.md",
            "[[Draft]] then ![[draft#Fig|figure]] and [[draft.md]]\n[[seed]]",
        );
        index.add_note("Inbox/draft.md", "self: [[draft]]");
        index
    }

    #[test]
    fn test_same_stem_move_needs_no_update() {
        let moves = vec![MoveOperation::new(
            "Inbox/draft.md",
            "Permanent/draft.md",
            "category",
        )];
        assert!(LinkUpdatePlanner::plan_link_updates(&moves, &index()).is_empty());
    }

    #[test]
    fn test_one_update_per_occurrence() {
        let moves = vec![MoveOperation::new(
            "Inbox/draft.md",
            "Permanent/Final Draft.md",
            "rename",
        )];
        let updates = LinkUpdatePlanner::plan_link_updates(&moves, &index());
        assert_eq!(updates.len(), 4);

        // Referencing files in path order, occurrences in source order
        let texts: Vec<_> = updates.iter().map(|u| u.new_text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "[[Final Draft]]",
                "[[Final Draft]]",
                "![[Final Draft#Fig|figure]]",
                "[[Final Draft]]",
            ]
        );
        assert_eq!(updates[0].file, Path::new("Inbox/draft.md"));
        assert!(updates.iter().all(|u| u.new_target == "Final Draft"));
    }

    #[test]
    fn test_prefixed_stem_references() {
        let moves = vec![MoveOperation::new(
            "Inbox/202401011200 seed.md",
            "Literature/seed.md",
            "rename",
        )];
        let updates = LinkUpdatePlanner::plan_link_updates(&moves, &index());
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].file, Path::new("Inbox/journal.md"));
        assert_eq!(updates[0].new_text, "[[seed]]");
    }
}
