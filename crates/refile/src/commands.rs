//! Command dispatch.
//!
//! Every command writes its report to the given writer and returns whether the
//! run counts as a success for the process exit code.

use crate::cli::{Cli, Command};
use anyhow::{Context, bail};
use refile_batch::{ApplyOutcome, ExecuteOptions, Reorganizer};
use refile_core::{BackupSessionId, ReorgConfig, SharedObserver, default_observer};
use refile_export::{
    ExecutionExporter, LinkSummary, OutputFormat, PlanReportExporter, ValidationExporter,
};
use std::io::Write;

/// Run the parsed command against the resolved configuration
pub fn run(cli: &Cli, out: &mut dyn Write) -> anyhow::Result<bool> {
    let config = cli.resolve_config()?;
    run_with(config, &cli.command, default_observer(), out)
}

/// Like [`run`], with an explicit configuration and observer
#[tracing::instrument(skip_all, fields(vault = %config.vault_root.display()))]
pub fn run_with(
    config: ReorgConfig,
    command: &Command,
    observer: SharedObserver,
    out: &mut dyn Write,
) -> anyhow::Result<bool> {
    let reorganizer = Reorganizer::new(config, observer).context("Cannot open vault")?;

    match command {
        Command::Plan { format } => plan(&reorganizer, *format, out),
        Command::Apply {
            no_backup,
            no_validate,
            no_rollback,
            dry_run,
            auto_rollback,
        } => {
            if *dry_run {
                return plan(&reorganizer, OutputFormat::Markdown, out);
            }
            let options = ExecuteOptions {
                create_backup: !no_backup,
                validate_first: !no_validate,
                rollback_on_error: !no_rollback,
            };
            apply(&reorganizer, options, *auto_rollback, out)
        }
        Command::Backup => {
            let id = reorganizer
                .backups()
                .create_backup()
                .context("Backup failed")?;
            writeln!(out, "Created backup {}", id)?;
            Ok(true)
        }
        Command::Backups => {
            let sessions = reorganizer.backups().list_backups()?;
            if sessions.is_empty() {
                writeln!(
                    out,
                    "No backups in {}",
                    reorganizer.backups().backup_root().display()
                )?;
            }
            for info in sessions {
                writeln!(
                    out,
                    "{}\t{}\t{} files",
                    info.id,
                    info.created_at.format("%Y-%m-%d %H:%M:%S"),
                    info.file_count
                )?;
            }
            Ok(true)
        }
        Command::Rollback { session_id } => {
            let id = parse_session(session_id)?;
            let report = reorganizer
                .backups()
                .rollback(&id)
                .with_context(|| format!("Rollback to {} failed", id))?;
            writeln!(
                out,
                "Restored {} of {} files from {}",
                report.restored_files, report.expected_files, report.session_id
            )?;
            if let Some(emergency) = &report.emergency_backup {
                writeln!(out, "Pre-rollback state saved as {}", emergency)?;
            }
            if !report.verified {
                writeln!(out, "WARNING: restored tree does not match the backup digest")?;
            }
            Ok(report.verified)
        }
        Command::Prune { keep, dry_run } => {
            let report = reorganizer.backups().prune(*keep, *dry_run)?;
            let verb = if report.dry_run {
                "Would delete"
            } else {
                "Deleted"
            };
            for id in &report.deleted {
                writeln!(out, "{} {}", verb, id)?;
            }
            writeln!(
                out,
                "{} {} session(s), kept {}",
                verb,
                report.deleted.len(),
                report.kept.len()
            )?;
            Ok(true)
        }
        Command::Validate { session, format } => {
            let id = session.as_deref().map(parse_session).transpose()?;
            let report = reorganizer.validate(id.as_ref())?;
            match format {
                OutputFormat::Markdown => {
                    write!(out, "{}", ValidationExporter::to_markdown(&report))?
                }
                OutputFormat::Json => {
                    writeln!(out, "{}", ValidationExporter::to_json(&report)?)?
                }
                OutputFormat::JsonLines => bail!("Validation reports support markdown or json"),
            }
            Ok(report.validation_passed)
        }
        Command::Links { broken_only } => {
            let index = reorganizer.scan_links()?;
            write!(out, "{}", LinkSummary::from_index(&index).to_markdown(*broken_only))?;
            Ok(true)
        }
    }
}

fn parse_session(raw: &str) -> anyhow::Result<BackupSessionId> {
    raw.parse::<BackupSessionId>().map_err(anyhow::Error::msg)
}

fn plan(
    reorganizer: &Reorganizer,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<bool> {
    let plan = reorganizer.plan().context("Planning failed")?;
    match format {
        OutputFormat::Markdown => write!(out, "{}", PlanReportExporter::to_markdown(&plan))?,
        OutputFormat::JsonLines => write!(out, "{}", PlanReportExporter::to_json_lines(&plan)?)?,
        OutputFormat::Json => bail!("Plans support markdown or jsonl"),
    }
    Ok(true)
}

fn apply(
    reorganizer: &Reorganizer,
    options: ExecuteOptions,
    auto_rollback: bool,
    out: &mut dyn Write,
) -> anyhow::Result<bool> {
    let mut report_progress = |done: usize, total: usize, name: &str| {
        log::info!("[{}/{}] {}", done, total, name);
    };
    let ApplyOutcome {
        execution,
        validation,
        rollback,
    } = reorganizer
        .apply_and_validate(options, auto_rollback, Some(&mut report_progress))
        .context("Apply failed")?;

    writeln!(out, "{}", ExecutionExporter::summary(&execution))?;
    if !validation.validation_passed {
        write!(out, "{}", ValidationExporter::to_markdown(&validation))?;
    }
    if let Some(report) = &rollback {
        writeln!(
            out,
            "Validation failed; vault restored from {} ({} files, verified: {})",
            report.session_id, report.restored_files, report.verified
        )?;
    }
    Ok(execution.success && validation.validation_passed)
}
