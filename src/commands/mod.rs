//! Subcommand handlers. Results go to stdout as JSON; logs go to stderr.

use std::io::{self, IsTerminal, Write};

use anyhow::{Context, Result};
use obplatform::{BehaviorId, Connector, ExportOptions, StudyId};
use serde::Serialize;
use tracing::info;

use crate::ProcessExit;
use crate::app_config::{EffectiveConfig, LoadedConfig};
use crate::cli::ExportArgs;
use crate::terminal;

pub(crate) async fn run_behaviors_command(connector: &Connector) -> Result<ProcessExit> {
    let behaviors = connector
        .list_behaviors()
        .await
        .context("Failed to list behaviors")?;
    print_json(&behaviors)?;
    Ok(ProcessExit::Success)
}

pub(crate) async fn run_studies_command(
    connector: &Connector,
    studies: &[String],
) -> Result<ProcessExit> {
    let studies = study_ids(studies);
    let per_study = connector
        .list_behaviors_in_studies(&studies)
        .await
        .context("Failed to list behaviors in studies")?;
    print_json(&per_study)?;
    Ok(ProcessExit::Success)
}

pub(crate) async fn run_health_command(connector: &Connector) -> Result<ProcessExit> {
    let health = connector
        .check_health()
        .await
        .context("Failed to reach the health endpoint")?;
    print_json(&health)?;
    Ok(if health.healthy {
        ProcessExit::Success
    } else {
        ProcessExit::Failure
    })
}

pub(crate) async fn run_export_command(
    connector: &Connector,
    args: &ExportArgs,
    show_progress_default: bool,
    quiet: bool,
) -> Result<ProcessExit> {
    let behaviors: Vec<BehaviorId> = args
        .behaviors
        .iter()
        .map(|id| BehaviorId::from(id.trim()))
        .collect();
    let studies = study_ids(&args.studies);

    let show_bar = terminal::should_show_progress_bar(
        args.progress || show_progress_default,
        io::stderr().is_terminal(),
        quiet,
        terminal::is_dumb_terminal(),
    );
    let chunk_size = usize::try_from(args.chunk_size).context("chunk size does not fit in memory")?;
    let options = ExportOptions::default()
        .with_progress_bar(show_bar)
        .with_chunk_size(chunk_size);

    let summary = connector
        .download_export(&args.output, &behaviors, &studies, &options)
        .await
        .with_context(|| format!("Failed to download export to '{}'", args.output.display()))?;

    info!(
        path = %summary.path.display(),
        bytes = summary.bytes_written,
        "Saved export archive"
    );
    print_json(&summary)?;
    Ok(ProcessExit::Success)
}

pub(crate) fn run_config_show_command(
    loaded: &LoadedConfig,
    effective: &EffectiveConfig,
) -> Result<ProcessExit> {
    let resolved_path = loaded.path.as_ref().map_or_else(
        || "<unresolved>".to_string(),
        |path| path.display().to_string(),
    );
    let connector = &effective.connector;
    let max_polls = connector
        .max_poll_attempts
        .map_or_else(|| "unlimited".to_string(), |n| n.to_string());

    let mut out = io::stdout().lock();
    writeln!(out, "config_path = {resolved_path}")?;
    writeln!(
        out,
        "config_file = {}",
        if loaded.loaded_from_file() {
            "loaded"
        } else {
            "not found (using defaults)"
        }
    )?;
    writeln!(out, "endpoint = {}", connector.endpoint)?;
    writeln!(out, "connect_timeout_secs = {}", connector.connect_timeout_secs)?;
    writeln!(out, "read_timeout_secs = {}", connector.read_timeout_secs)?;
    writeln!(out, "poll_interval_ms = {}", connector.poll_interval.as_millis())?;
    writeln!(out, "max_poll_attempts = {max_polls}")?;
    writeln!(out, "show_progress = {}", effective.show_progress)?;
    Ok(ProcessExit::Success)
}

/// Study ids as typed on the command line, surrounding whitespace removed.
fn study_ids(raw: &[String]) -> Vec<StudyId> {
    raw.iter().map(|id| StudyId::from(id.trim())).collect()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render JSON output")?;
    let mut out = io::stdout().lock();
    writeln!(out, "{rendered}")?;
    Ok(())
}
