//! # Refile Parser
//!
//! Note-level parsing for the reorganization engine:
//!
//! - [`MetadataCodec`]: YAML frontmatter split/render that never fails
//! - [`parse_wikilinks`]: `[[Note]]`, `[[Note|Alias]]`, `[[Note#Section]]`, `![[Embed]]`
//! - [`normalize_target`]: the case-folded lookup key shared by scanner and planners
//! - [`render_wikilink`]: re-render a link for a new target, keeping its shape
//! - [`parse_markdown_links`]: relative media/attachment destinations
//!
//! Code blocks, inline code and HTML are detected with `pulldown-cmark` and
//! excluded, so a link quoted in code is never treated as a reference.
//!
//! ## Quick Start
//!
//! ```
//! use refile_parser::{MetadataCodec, normalize_target, parse_wikilinks, render_wikilink};
//!
//! let content = "---\ncategory: permanent\n---\nSee [[Idea#Core|the idea]] and ![[Sketch]].";
//!
//! let note = MetadataCodec::parse(content);
//! assert_eq!(note.metadata.category().as_deref(), Some("permanent"));
//!
//! let links = parse_wikilinks(content);
//! assert_eq!(links.len(), 2);
//! assert_eq!(normalize_target(&links[0].target), "idea");
//! assert_eq!(render_wikilink(&links[0], "Big Idea"), "[[Big Idea#Core|the idea]]");
//! ```

mod excluded;
pub mod media;
pub mod metadata;
pub mod wikilinks;

pub use media::{MarkdownLink, parse_markdown_links};
pub use metadata::{Metadata, MetadataCodec, ParsedNote};
pub use wikilinks::{
    DEFAULT_NOTE_EXTENSIONS, normalize_target, normalize_target_with, parse_wikilinks,
    render_wikilink,
};
