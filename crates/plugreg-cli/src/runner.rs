//! Command execution and runtime logic.
//!
//! Contains logging initialization and the command dispatch used by `main`.

use anyhow::{Context, Result};
use plugreg_store::{Registry, RegistryConfig};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Commands;
use crate::commands;
use crate::formatters::format_output;
use crate::output::{ExitCode, OutputFormat};

/// Initializes logging infrastructure.
///
/// `verbose` forces debug level. Otherwise `RUST_LOG` wins over
/// `default_level`, the level from the config file.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(verbose: bool, default_level: &str) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("failed to initialize logging")?;

    Ok(())
}

/// Opens the registry at `root`, creating it if needed.
///
/// # Errors
///
/// Returns an error if the root is invalid or cannot be created.
pub fn open_registry(root: PathBuf) -> Result<Registry> {
    let display = root.display().to_string();
    Registry::new(RegistryConfig::new(root))
        .with_context(|| format!("failed to open plugin registry at {display}"))
}

/// Executes the specified CLI command and prints its result to stdout.
///
/// # Errors
///
/// Returns an error if the command or output formatting fails.
pub fn execute_command(
    command: Commands,
    registry: &Registry,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    let output = render_command(command, registry, output_format)?;
    println!("{output}");
    Ok(ExitCode::SUCCESS)
}

/// Runs `command` and renders its outcome in `output_format`.
///
/// # Errors
///
/// Returns an error if the command or output formatting fails.
pub fn render_command(
    command: Commands,
    registry: &Registry,
    output_format: OutputFormat,
) -> Result<String> {
    let outcome = commands::run(command, registry)?;
    format_output(&outcome, output_format)
}
