//! Markdown link/image extraction: `[text](url)`, `![alt](url)`, `[text](<url with spaces>)`
//!
//! Only the URL part is reported (with its byte span) so callers can rewrite
//! relative paths in place without disturbing surrounding text.

use crate::excluded::ExcludedRanges;
use refile_core::Span;
use regex::Regex;
use std::sync::LazyLock;

/// Matches markdown links and images, capturing the destination.
static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?P<bang>!?)\[(?P<text>[^\[\]]*(?:\[[^\[\]]*\][^\[\]]*)*)\]\((?:<(?P<angle>[^>\n]+)>|(?P<url>[^()\s"<>]+))(?:\s+"[^"]*")?\)"#,
    )
    .unwrap()
});

/// Fast pre-filter
#[inline]
fn has_markdown_link(content: &str) -> bool {
    content.contains("](")
}

/// A markdown link destination found in content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownLink {
    /// Destination exactly as written (angle brackets removed)
    pub url: String,
    /// Span of the destination text inside the content
    pub url_span: Span,
    pub is_image: bool,
    /// Destination was wrapped in `<...>`
    pub angle_bracketed: bool,
}

impl MarkdownLink {
    /// Whether the destination is a relative filesystem path
    /// (not a URL, absolute path, or same-document anchor)
    pub fn is_relative_path(&self) -> bool {
        let url = self.url.as_str();
        !(url.is_empty()
            || url.starts_with('#')
            || url.starts_with('/')
            || url.starts_with('\\')
            || url.contains("://")
            || url.starts_with("mailto:")
            || url.starts_with("data:")
            || has_windows_drive(url))
    }

    /// Path portion of the destination, `%20` decoded and any `#fragment`/`?query` dropped
    pub fn path_part(&self) -> String {
        let end = self.url.find(['#', '?']).unwrap_or(self.url.len());
        self.url[..end].replace("%20", " ")
    }

    /// Fragment/query suffix including its leading `#` or `?`
    pub fn suffix(&self) -> &str {
        let start = self.url.find(['#', '?']).unwrap_or(self.url.len());
        &self.url[start..]
    }
}

fn has_windows_drive(url: &str) -> bool {
    let bytes = url.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Extract markdown links and images from `content`, in source order
pub fn parse_markdown_links(content: &str) -> Vec<MarkdownLink> {
    if !has_markdown_link(content) {
        return Vec::new();
    }
    let excluded = ExcludedRanges::scan(content);

    MARKDOWN_LINK
        .captures_iter(content)
        .filter_map(|caps| {
            let full = caps.get(0)?;
            if excluded.contains(full.start()) {
                return None;
            }
            let is_image = caps.name("bang").is_some_and(|m| !m.as_str().is_empty());
            let (m, angle_bracketed) = match caps.name("angle") {
                Some(m) => (m, true),
                None => (caps.name("url")?, false),
            };
            Some(MarkdownLink {
                url: m.as_str().to_string(),
                url_span: Span::new(m.start(), m.end()),
                is_image,
                angle_bracketed,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_and_link() {
        let content = "![chart](../assets/chart.png) and [doc](files/report.pdf)";
        let links = parse_markdown_links(content);
        assert_eq!(links.len(), 2);
        assert!(links[0].is_image);
        assert_eq!(links[0].url, "../assets/chart.png");
        assert_eq!(
            &content[links[0].url_span.start..links[0].url_span.end],
            "../assets/chart.png"
        );
        assert!(!links[1].is_image);
    }

    #[test]
    fn test_angle_brackets_and_title() {
        let links = parse_markdown_links("![a](<my pics/cat.png> \"Cat\")");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "my pics/cat.png");
        assert!(links[0].angle_bracketed);
    }

    #[test]
    fn test_relative_detection() {
        let links = parse_markdown_links(
            "[a](https://x.org) [b](#top) [c](/abs.png) [d](img.png#frag) [e](C:/x.png)",
        );
        let relative: Vec<_> = links.iter().map(|l| l.is_relative_path()).collect();
        assert_eq!(relative, vec![false, false, false, true, false]);
        assert_eq!(links[3].path_part(), "img.png");
        assert_eq!(links[3].suffix(), "#frag");
    }

    #[test]
    fn test_percent_encoded_space() {
        let links = parse_markdown_links("![x](my%20pic.png)");
        assert_eq!(links[0].path_part(), "my pic.png");
    }

    #[test]
    fn test_code_ignored() {
        let links = parse_markdown_links("`![x](a.png)` ![y](b.png)");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "b.png");
    }
}
