//! Relative media link rewriting for notes that change directory.
//!
//! Wiki-style embeds resolve by name and survive a move untouched; markdown
//! destinations like `![chart](../assets/chart.png)` are relative to the note
//! and must be recomputed so they keep pointing at the same file.

use refile_core::{PathValidator, Result};
use refile_parser::parse_markdown_links;
use std::path::{Component, Path, PathBuf};

/// Result of rewriting one note's content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaRewrite {
    pub content: String,
    pub rewritten: usize,
    /// Destinations that could not be resolved and were left as written
    pub failures: Vec<String>,
}

/// Rewrites media references inside a note for its new location
pub trait MediaLinkRewriter: Send + Sync {
    /// `from` and `to` are the note's vault-relative paths before and after the move
    fn rewrite(&self, content: &str, from: &Path, to: &Path) -> Result<MediaRewrite>;
}

/// Recomputes relative markdown image and attachment destinations.
///
/// URLs, absolute paths and links to other notes are left untouched.
#[derive(Debug, Clone)]
pub struct RelativeMediaRewriter {
    vault_root: PathBuf,
    note_extensions: Vec<String>,
}

impl RelativeMediaRewriter {
    pub fn new(vault_root: impl Into<PathBuf>, note_extensions: Vec<String>) -> Self {
        Self {
            vault_root: vault_root.into(),
            note_extensions,
        }
    }

    fn is_note_path(&self, path: &str) -> bool {
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some(ext) => self
                .note_extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext)),
            // Extension-less destinations are note links in most renderers
            None => true,
        }
    }
}

impl MediaLinkRewriter for RelativeMediaRewriter {
    fn rewrite(&self, content: &str, from: &Path, to: &Path) -> Result<MediaRewrite> {
        let old_dir = from.parent().unwrap_or(Path::new(""));
        let new_dir = to.parent().unwrap_or(Path::new(""));

        let mut result = MediaRewrite {
            content: content.to_string(),
            ..Default::default()
        };
        if old_dir == new_dir {
            return Ok(result);
        }

        let mut replacements = Vec::new();
        for link in parse_markdown_links(content) {
            if !link.is_relative_path() {
                continue;
            }
            let path_part = link.path_part();
            if !link.is_image && self.is_note_path(&path_part) {
                continue;
            }

            let joined = old_dir.join(&path_part);
            let referenced = PathValidator::normalize(&joined);
            if !PathValidator::is_confined(&joined) || !self.vault_root.join(&referenced).exists()
            {
                result.failures.push(format!(
                    "{}: cannot resolve '{}'",
                    from.display(),
                    link.url
                ));
                continue;
            }

            let Some(relative) = pathdiff::diff_paths(&referenced, new_dir) else {
                result.failures.push(format!(
                    "{}: no relative path from {} to '{}'",
                    from.display(),
                    new_dir.display(),
                    referenced.display()
                ));
                continue;
            };

            let mut url = to_url_path(&relative);
            if !link.angle_bracketed {
                url = url.replace(' ', "%20");
            }
            url.push_str(link.suffix());
            if url != link.url {
                replacements.push((link.url_span, url));
            }
        }

        // Back to front so earlier spans stay valid
        for (span, url) in replacements.into_iter().rev() {
            result.content.replace_range(span.start..span.end, &url);
            result.rewritten += 1;
        }
        Ok(result)
    }
}

/// Forward-slash form of a relative path
fn to_url_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
