//! # Refile Graph
//!
//! Wiki-link index used for planning link rewrites and for post-run integrity
//! checks.
//!
//! - [`NoteCatalog`]: which names a link can resolve to (exact stem, attachment
//!   file name, or stem suffix for timestamp-prefixed files)
//! - [`LinkIndex`]: `file → links`, `target → referencing files`, and the set
//!   of unresolved references. Ordered maps keep it independent of scan order.
//! - [`LinkGraphScanner`]: builds the index from disk
//!
//! ## Quick Start
//!
//! ```
//! use refile_graph::{LinkIndex, NoteCatalog};
//! use std::path::Path;
//!
//! let mut catalog = NoteCatalog::new();
//! catalog.add_note(Path::new("Inbox/Idea.md"));
//!
//! let mut index = LinkIndex::new(catalog);
//! index.add_note("Journal.md", "Thinking about [[Idea]] and [[Missing]]");
//!
//! assert_eq!(index.referencing("idea"), vec![Path::new("Journal.md")]);
//! assert_eq!(index.broken_count(), 1);
//! ```

pub mod catalog;
pub mod index;
pub mod scanner;

pub use catalog::NoteCatalog;
pub use index::LinkIndex;
pub use scanner::LinkGraphScanner;
