//! Command-line surface.

use clap::{ArgAction, Parser, Subcommand};
use refile_core::{PathValidator, ReorgConfig};
use refile_export::OutputFormat;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Reorganize a markdown vault by frontmatter category, safely
#[derive(Parser, Debug)]
#[command(name = "refile", author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, env = "REFILE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Vault root directory (overrides the config file)
    #[arg(long, env = "REFILE_VAULT", global = true)]
    pub vault: Option<PathBuf>,

    /// Directory holding backup sessions, outside the vault
    #[arg(long, global = true)]
    pub backup_root: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format (human, json)
    #[arg(long, default_value = "human", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show what would move, without touching the vault
    Plan {
        /// Report format (markdown, jsonl)
        #[arg(long, default_value = "markdown")]
        format: OutputFormat,
    },
    /// Back up, move, rewrite links, then validate
    Apply {
        /// Skip the backup session (no rollback possible)
        #[arg(long)]
        no_backup: bool,
        /// Do not re-plan and check conflicts before executing
        #[arg(long)]
        no_validate: bool,
        /// Leave the vault as-is if a move fails
        #[arg(long)]
        no_rollback: bool,
        /// Print the plan and stop
        #[arg(long)]
        dry_run: bool,
        /// Roll back when post-run validation fails
        #[arg(long)]
        auto_rollback: bool,
    },
    /// Take a backup session now
    Backup,
    /// List backup sessions, newest first
    Backups,
    /// Restore the vault from a backup session
    Rollback {
        session_id: String,
    },
    /// Delete all but the newest N backup sessions
    Prune {
        #[arg(long)]
        keep: usize,
        #[arg(long)]
        dry_run: bool,
    },
    /// Check note readability and link health
    Validate {
        /// Compare note counts against this backup session
        #[arg(long)]
        session: Option<String>,
        /// Report format (markdown, json)
        #[arg(long, default_value = "markdown")]
        format: OutputFormat,
    },
    /// Link-graph summary
    Links {
        #[arg(long)]
        broken_only: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Ok(LogFormat::Human),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!(
                "Unknown log format '{}'. Valid options: human, json",
                s
            )),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Human => write!(f, "human"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl Cli {
    /// Resolve the effective configuration.
    ///
    /// A config file is loaded first; `--vault` and `--backup-root` override
    /// it. Without a backup root, sessions go to `<vault>-backups` next to the
    /// vault.
    pub fn resolve_config(&self) -> anyhow::Result<ReorgConfig> {
        use anyhow::Context;

        let mut config = match &self.config {
            Some(path) => ReorgConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => {
                let vault = self
                    .vault
                    .as_ref()
                    .context("No vault given: pass --vault or --config")?;
                let vault = PathValidator::expand(vault)?;
                let backup_root = match &self.backup_root {
                    Some(root) => PathValidator::expand(root)?,
                    None => sibling_backup_root(&vault),
                };
                return ReorgConfig::builder(vault, backup_root)
                    .build()
                    .context("Invalid configuration");
            }
        };

        if let Some(vault) = &self.vault {
            config.vault_root = PathValidator::expand(vault)?;
        }
        if let Some(root) = &self.backup_root {
            config.backup_root = PathValidator::expand(root)?;
        }
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

fn sibling_backup_root(vault: &std::path::Path) -> PathBuf {
    let absolute = PathValidator::absolute(vault);
    let name = absolute
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("vault");
    let parent = absolute
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    parent.join(format!("{}-backups", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_apply_flags() {
        let cli = Cli::try_parse_from([
            "refile", "--vault", "/v", "-vv", "apply", "--no-backup", "--auto-rollback",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_level(), log::LevelFilter::Debug);
        match cli.command {
            Command::Apply {
                no_backup,
                auto_rollback,
                dry_run,
                ..
            } => {
                assert!(no_backup);
                assert!(auto_rollback);
                assert!(!dry_run);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_format_values_rejected() {
        assert!(Cli::try_parse_from(["refile", "plan", "--format", "xml"]).is_err());
        assert!(Cli::try_parse_from(["refile", "--log-format", "yaml", "backups"]).is_err());
        let cli = Cli::try_parse_from(["refile", "validate", "--format", "json"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Validate {
                format: OutputFormat::Json,
                ..
            }
        ));
    }

    #[test]
    fn test_default_backup_root_is_sibling() {
        let temp = TempDir::new().unwrap();
        let vault = temp.path().join("notes");
        let cli = Cli::try_parse_from([
            "refile",
            "--vault",
            vault.to_str().unwrap(),
            "backups",
        ])
        .unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.backup_root, temp.path().join("notes-backups"));
    }

    #[test]
    fn test_nested_backup_root_rejected() {
        let temp = TempDir::new().unwrap();
        let vault = temp.path().join("notes");
        let nested = vault.join("bk");
        let cli = Cli::try_parse_from([
            "refile",
            "--vault",
            vault.to_str().unwrap(),
            "--backup-root",
            nested.to_str().unwrap(),
            "backups",
        ])
        .unwrap();
        assert!(cli.resolve_config().is_err());
    }
}
