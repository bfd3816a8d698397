//! # Reorganization Engine
//!
//! Plans and applies category-driven moves across a vault. Every mutating run
//! happens inside a backup session: either all moves and link rewrites land,
//! or the vault is restored from the snapshot taken at the start.
//!
//! - [`MovePlanner`]: dry run from frontmatter `category` fields
//! - [`LinkUpdatePlanner`]: wiki-link rewrites implied by renamed notes
//! - [`MoveExecutor`]: backup, move, rewrite, roll back on failure
//! - [`IntegrityValidator`]: post-run readability and link health
//! - [`Reorganizer`]: facade wiring the above to one configuration
//!
//! ## Example
//!
//! ```no_run
//! use refile_batch::{ExecuteOptions, Reorganizer};
//! use refile_core::prelude::*;
//!
//! # fn main() -> refile_core::Result<()> {
//! let config = ReorgConfig::builder("/data/vault", "/data/vault-backups").build()?;
//! let reorganizer = Reorganizer::new(config, default_observer())?;
//!
//! let plan = reorganizer.plan()?;
//! println!("{} moves, {} conflicts", plan.moves().len(), plan.conflicts().len());
//!
//! let outcome = reorganizer.apply_and_validate(ExecuteOptions::default(), true, None)?;
//! assert!(outcome.succeeded());
//! # Ok(())
//! # }
//! ```

pub mod executor;
pub mod links;
pub mod planner;
pub mod reorganizer;
pub mod validator;

pub use executor::{ExecuteOptions, MoveExecutor, ProgressFn};
pub use links::LinkUpdatePlanner;
pub use planner::MovePlanner;
pub use reorganizer::{ApplyOutcome, Reorganizer};
pub use validator::IntegrityValidator;
