//! # refile
//!
//! Command-line front end for the reorganization engine. The binary parses
//! [`Cli`], installs logging, then hands off to [`commands::run`].

pub mod cli;
pub mod commands;
pub mod logging;

pub use cli::{Cli, Command, LogFormat};
pub use refile_core::prelude::*;
