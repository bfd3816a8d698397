//! # Refile Core
//!
//! Core data models, error type, and configuration for the vault reorganization
//! engine. This crate defines the canonical types that all other crates depend on.
//!
//! ## Architecture Principles
//!
//! - **Type-Driven Design**: `LinkForm`, `BackupSessionId` and friends replace strings
//! - **Zero Panic in Libraries**: All fallible operations return `Result<T, BackupError>`
//! - **Builder Pattern for Configuration**: [`ReorgConfig::builder`] validates on `build()`
//! - **Explicit Observability**: components receive a [`ReorgObserver`] instead of a global logger
//!
//! ## Core Modules
//!
//! - [`models`] - Plans, moves, links, execution and validation results
//! - [`error`] - [`BackupError`] and the `Result` alias
//! - [`config`] - [`ReorgConfig`] and its builder
//! - [`observer`] - Logging interface and implementations
//! - [`utils`] - Path validation and transaction tracking
//!
//! ## Usage
//!
//! ```
//! use refile_core::prelude::*;
//!
//! let config = ReorgConfig::builder("/data/vault", "/data/vault-backups")
//!     .category("project", "Projects")
//!     .build()
//!     .unwrap();
//! assert_eq!(config.directory_for("Project"), Some("Projects"));
//!
//! // A backup root inside the vault is always rejected
//! let nested = ReorgConfig::builder("/data/vault", "/data/vault/.backups").build();
//! assert!(matches!(nested, Err(BackupError::NestedBackupRoot { .. })));
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod observer;
pub mod utils;

pub use config::*;
pub use error::{BackupError, Result};
pub use models::*;
pub use observer::{
    EventLevel, LogObserver, ObservedEvent, RecordingObserver, ReorgObserver, SharedObserver,
    default_observer,
};
pub use utils::{PathValidator, TransactionBuilder};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::ReorgConfig;
    pub use crate::error::{BackupError, Result};
    pub use crate::models::{
        BackupSessionId, ExecutionResult, LinkForm, LinkUpdate, MoveOperation, MovePlan,
        PlanStats, Span, ValidationReport, WikiLink,
    };
    pub use crate::observer::{
        EventLevel, LogObserver, RecordingObserver, ReorgObserver, SharedObserver,
        default_observer,
    };
    pub use crate::utils::PathValidator;
}
