//! CLI entry point for the obplatform tool.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use obplatform::Connector;
use tracing::debug;

mod app_config;
mod cli;
mod commands;
mod terminal;

use cli::{Args, Command};

/// Process exit outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    Success,
    Failure,
}

impl From<ProcessExit> for ExitCode {
    fn from(value: ProcessExit) -> Self {
        match value {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Failure => ExitCode::FAILURE,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    terminal::init_tracing(terminal::default_log_level(args.verbose, args.quiet));
    debug!(?args, "CLI arguments parsed");

    match run(args).await {
        Ok(outcome) => outcome.into(),
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ProcessExit> {
    let loaded = app_config::load_file_config(args.config.as_deref())?;
    let effective = app_config::resolve_effective_config(
        args.endpoint.as_deref(),
        std::env::var(app_config::ENDPOINT_ENV_VAR).ok(),
        loaded.config.as_ref(),
    );

    match &args.command {
        Command::Config => commands::run_config_show_command(&loaded, &effective),
        Command::Behaviors => commands::run_behaviors_command(&connector(&effective)?).await,
        Command::Studies { studies } => {
            commands::run_studies_command(&connector(&effective)?, studies).await
        }
        Command::Health => commands::run_health_command(&connector(&effective)?).await,
        Command::Export(export_args) => {
            commands::run_export_command(
                &connector(&effective)?,
                export_args,
                effective.show_progress,
                args.quiet,
            )
            .await
        }
    }
}

fn connector(effective: &app_config::EffectiveConfig) -> Result<Connector> {
    let connector =
        Connector::with_config(&effective.connector).context("Failed to create connector")?;
    debug!(endpoint = %connector.endpoint(), "using endpoint");
    Ok(connector)
}
