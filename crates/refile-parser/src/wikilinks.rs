//! Wiki-link extraction: `[[Note]]`, `[[Note|Alias]]`, `[[Note#Section]]`, `![[Note]]`
//!
//! Links inside fenced code, inline code and HTML are ignored. Same-note
//! anchors (`[[#Heading]]`) are not references to another note and are skipped.

use crate::excluded::ExcludedRanges;
use refile_core::{LinkForm, Span, WikiLink};
use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Matches `[[...]]` and `![[...]]` on a single line
static WIKILINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(!?)\[\[([^\[\]\n]+)\]\]").unwrap());

/// Extensions stripped by [`normalize_target`] when no vault configuration applies
pub const DEFAULT_NOTE_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Fast pre-filter: skip regex if no wikilink pattern exists.
#[inline]
fn has_wikilink(content: &str) -> bool {
    content.contains("[[")
}

/// Pre-computed line starts for O(log n) line lookup.
pub(crate) struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(content: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in content.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// 1-based line containing `offset`
    pub(crate) fn line(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset).max(1)
    }
}

/// Extract every wiki-link occurrence from `content`, in source order
pub fn parse_wikilinks(content: &str) -> Vec<WikiLink> {
    if !has_wikilink(content) {
        return Vec::new();
    }

    let excluded = ExcludedRanges::scan(content);
    let index = LineIndex::new(content);

    WIKILINK_PATTERN
        .captures_iter(content)
        .filter_map(|caps| {
            let full = caps.get(0)?;
            if excluded.contains(full.start()) {
                return None;
            }
            let is_embed = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
            let inner = caps.get(2)?.as_str();
            let (target, section, alias) = split_inner(inner)?;

            let form = if is_embed {
                LinkForm::Embed { section, alias }
            } else {
                LinkForm::Standard { section, alias }
            };

            Some(WikiLink {
                raw: full.as_str().to_string(),
                target,
                form,
                line: index.line(full.start()),
                span: Span::new(full.start(), full.end()),
            })
        })
        .collect()
}

/// Split `Note#Section|Alias` into its parts. `None` for same-note anchors.
fn split_inner(inner: &str) -> Option<(String, Option<String>, Option<String>)> {
    let (reference, alias) = match inner.split_once('|') {
        Some((reference, alias)) => (reference, Some(alias.trim().to_string())),
        None => (inner, None),
    };
    let (target, section) = match reference.split_once('#') {
        Some((target, section)) => (target, Some(section.trim().to_string())),
        None => (reference, None),
    };

    let target = target.trim();
    if target.is_empty() {
        return None;
    }
    Some((
        target.to_string(),
        section.filter(|s| !s.is_empty()),
        alias.filter(|a| !a.is_empty()),
    ))
}

/// Canonical lookup key for a link target or a note stem.
///
/// Drops any `#section`, keeps only the last path segment, strips a note
/// extension, then NFC-normalizes and case-folds. Uses
/// [`DEFAULT_NOTE_EXTENSIONS`]; see [`normalize_target_with`] for vaults that
/// configure their own.
pub fn normalize_target(target: &str) -> String {
    normalize_target_with(target, DEFAULT_NOTE_EXTENSIONS)
}

/// [`normalize_target`] with an explicit set of note extensions (without the dot)
pub fn normalize_target_with<S: AsRef<str>>(target: &str, extensions: &[S]) -> String {
    let without_section = target.split('#').next().unwrap_or("");
    let name = without_section
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(without_section)
        .trim();

    let lower: String = name.nfc().collect::<String>().to_lowercase();
    for ext in extensions {
        let ext = ext.as_ref().trim_start_matches('.').to_lowercase();
        if ext.is_empty() {
            continue;
        }
        if let Some(stripped) = lower
            .strip_suffix(ext.as_str())
            .and_then(|rest| rest.strip_suffix('.'))
            && !stripped.is_empty()
        {
            return stripped.to_string();
        }
    }
    lower
}

/// Render `link` pointing at `new_target`, keeping embed flag, section and alias
pub fn render_wikilink(link: &WikiLink, new_target: &str) -> String {
    let mut out = String::with_capacity(new_target.len() + 8);
    if link.is_embed() {
        out.push('!');
    }
    out.push_str("[[");
    out.push_str(new_target);
    if let Some(section) = link.form.section() {
        out.push('#');
        out.push_str(section);
    }
    if let Some(alias) = link.form.alias() {
        out.push('|');
        out.push_str(alias);
    }
    out.push_str("]]");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_wikilink() {
        let links = parse_wikilinks("See [[Note]]");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, "Note");
        assert_eq!(links[0].raw, "[[Note]]");
        assert!(!links[0].is_embed());
        assert_eq!(links[0].span, Span::new(4, 12));
    }

    #[test]
    fn test_alias_and_section() {
        let links = parse_wikilinks("[[Note#Intro|see intro]]");
        assert_eq!(links[0].target, "Note");
        assert_eq!(links[0].form.section(), Some("Intro"));
        assert_eq!(links[0].form.alias(), Some("see intro"));
        assert_eq!(links[0].display(), "see intro");
    }

    #[test]
    fn test_embed() {
        let links = parse_wikilinks("![[Diagram]] and [[Note]]");
        assert_eq!(links.len(), 2);
        assert!(links[0].is_embed());
        assert!(!links[1].is_embed());
        assert_eq!(links[0].span.start, 0);
    }

    #[test]
    fn test_same_note_anchor_skipped() {
        let links = parse_wikilinks("Jump to [[#Heading]] or [[Other]]");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, "Other");
    }

    #[test]
    fn test_line_numbers_follow_source_order() {
        let content = "Line 1 [[A]]\nLine 2\nLine 3 [[B]] [[C]]";
        let links = parse_wikilinks(content);
        let lines: Vec<_> = links.iter().map(|l| l.line).collect();
        assert_eq!(lines, vec![1, 3, 3]);
    }

    #[test]
    fn test_code_is_ignored() {
        let content = "```\n[[InCode]]\n```\n`[[Inline]]` [[Real]]";
        let links = parse_wikilinks(content);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, "Real");

        let tilde = parse_wikilinks("~~~\n[[InCode]]\n~~~\n[[Real]]");
        let targets: Vec<_> = tilde.iter().map(|l| l.target.as_str()).collect();
        assert_eq!(targets, vec!["Real"]);
    }

    #[test]
    fn test_normalize_target() {
        assert_eq!(normalize_target("My Note"), "my note");
        assert_eq!(normalize_target("My Note.md"), "my note");
        assert_eq!(normalize_target("folder/My Note#Section"), "my note");
        assert_eq!(normalize_target("  Spaced  "), "spaced");
        assert_eq!(normalize_target("image.png"), "image.png");
        // NFD input folds to the same key as NFC
        assert_eq!(normalize_target("Cafe\u{301}"), normalize_target("Caf\u{e9}"));
        assert_eq!(normalize_target("notes.txt"), "notes.txt");
    }

    #[test]
    fn test_normalize_with_configured_extensions() {
        let txt = ["txt"];
        assert_eq!(normalize_target_with("Foo.TXT", &txt), "foo");
        assert_eq!(normalize_target_with("dir/foo.txt#Part", &txt), "foo");
        // Only the configured extensions are stripped
        assert_eq!(normalize_target_with("foo.md", &txt), "foo.md");
        assert_eq!(normalize_target_with("foo.txt", &[".txt".to_string()]), "foo");
        assert_eq!(normalize_target_with(".txt", &txt), ".txt");
    }

    #[test]
    fn test_render_preserves_shape() {
        let links = parse_wikilinks("![[old#Part|Shown]] [[old]]");
        assert_eq!(render_wikilink(&links[0], "new"), "![[new#Part|Shown]]");
        assert_eq!(render_wikilink(&links[1], "new"), "[[new]]");
    }
}
