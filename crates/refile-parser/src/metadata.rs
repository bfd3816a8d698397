//! Frontmatter codec: `---\nYAML\n---` at the very top of a note.
//!
//! Parsing never fails. A missing, unterminated, invalid or non-mapping block
//! yields an empty [`Metadata`] with the content left untouched.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// Matches a leading YAML block; the inner group is absent for `---\n---`.
static FRONTMATTER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A---[ \t]*\r?\n(?:([\s\S]*?)\r?\n)??---[ \t]*(?:\r?\n|\z)").unwrap()
});

/// Key-value metadata from a note's frontmatter, in source order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    data: Map<String, Value>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.data.insert(key.into(), value)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Lower-cased, trimmed string field; `None` when absent, blank or not a string
    fn string_field(&self, key: &str) -> Option<String> {
        self.data
            .get(key)
            .and_then(Value::as_str)
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
    }

    /// Declared category
    pub fn category(&self) -> Option<String> {
        self.string_field("category")
    }

    /// Declared status
    pub fn status(&self) -> Option<String> {
        self.string_field("status")
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.data
    }
}

/// Result of splitting a note into metadata and body
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedNote<'a> {
    pub metadata: Metadata,
    /// Content after the block, or the whole content when no valid block exists
    pub body: &'a str,
    /// True only when a block was found and decoded to a mapping
    pub has_block: bool,
}

/// Stateless frontmatter parser/serializer
pub struct MetadataCodec;

impl MetadataCodec {
    /// Split `content` into metadata and body
    pub fn parse(content: &str) -> ParsedNote<'_> {
        let untouched = ParsedNote {
            metadata: Metadata::default(),
            body: content,
            has_block: false,
        };

        let Some(caps) = FRONTMATTER_PATTERN.captures(content) else {
            return untouched;
        };
        let block_end = caps.get(0).map(|m| m.end()).unwrap_or(0);
        let yaml = caps.get(1).map(|m| m.as_str()).unwrap_or("");

        if yaml.trim().is_empty() {
            return ParsedNote {
                metadata: Metadata::default(),
                body: &content[block_end..],
                has_block: true,
            };
        }

        match serde_yaml::from_str::<Value>(yaml) {
            Ok(Value::Object(data)) => ParsedNote {
                metadata: Metadata { data },
                body: &content[block_end..],
                has_block: true,
            },
            Ok(_) => {
                log::debug!("Frontmatter is not a mapping, treating note as unstructured");
                untouched
            }
            Err(e) => {
                log::debug!("Frontmatter failed to parse: {}", e);
                untouched
            }
        }
    }

    /// Render metadata back in front of `body`. Empty metadata returns the body as is.
    pub fn serialize(metadata: &Metadata, body: &str) -> String {
        if metadata.is_empty() {
            return body.to_string();
        }
        match serde_yaml::to_string(&metadata.data) {
            Ok(yaml) => {
                let mut out = String::with_capacity(yaml.len() + body.len() + 8);
                out.push_str("---\n");
                out.push_str(&yaml);
                if !yaml.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str("---\n");
                out.push_str(body);
                out
            }
            Err(e) => {
                log::warn!("Failed to serialize frontmatter, writing body only: {}", e);
                body.to_string()
            }
        }
    }
}
