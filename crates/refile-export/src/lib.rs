//! # Report Export
//!
//! Renders reorganization data for people and for pipelines.
//!
//! ## Plans
//!
//! [`PlanReportExporter`] turns a dry-run [`MovePlan`](refile_core::MovePlan)
//! into either Markdown for review or JSON-lines for tooling. The JSON-lines
//! stream always starts with a `summary` record; every following line carries a
//! `record` tag (`move`, `conflict`, `unknown`, `malformed`, `link_update`,
//! `notice`). Both renderings close with a safety notice whenever moves are
//! pending.
//!
//! ## Results
//!
//! - [`ExecutionExporter`]: pretty JSON plus a terminal summary
//! - [`ValidationExporter`]: pretty JSON and Markdown
//! - [`LinkSummary`]: link-graph health, most referenced notes, broken links
//!
//! ## Example
//!
//! ```
//! use refile_core::MovePlan;
//! use refile_export::{OutputFormat, PlanReportExporter};
//!
//! let plan = MovePlan::default();
//! let format: OutputFormat = "jsonl".parse().unwrap();
//! assert_eq!(format, OutputFormat::JsonLines);
//!
//! let lines = PlanReportExporter::to_json_lines(&plan).unwrap();
//! assert!(lines.starts_with("{\"record\":\"summary\""));
//! ```

pub mod format;
pub mod links;
pub mod plan;
pub mod results;

pub use format::OutputFormat;
pub use links::{BrokenLink, LinkSummary, TargetCount};
pub use plan::{PlanReportExporter, SAFETY_NOTICE};
pub use results::{ExecutionExporter, ValidationExporter};
