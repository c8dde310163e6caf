//! plugreg command-line interface.
//!
//! Installs, lists, toggles, inspects, verifies and removes plugins packaged
//! as single-file images.
//!
//! # Examples
//!
//! ```bash
//! # Install under the manifest name, then under an explicit one
//! plugreg install ./tool.image
//! plugreg install ./tool.image --name vendor/tool
//!
//! # Inspect an image file or an installed plugin
//! plugreg inspect ./tool.image
//! plugreg inspect vendor/tool
//!
//! plugreg --format json list
//! plugreg disable vendor/tool
//! plugreg uninstall vendor/tool
//! ```

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use plugreg_cli::config::CliConfig;
use plugreg_cli::runner::{execute_command, init_logging, open_registry};
use plugreg_cli::{Cli, ExitCode, OutputFormat};

fn main() {
    let cli = Cli::parse();

    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::for_error(&e)
        }
    };

    std::process::exit(exit_code.as_i32());
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = CliConfig::load(cli.config.as_deref())?;

    init_logging(cli.verbose, &config.log_level)?;

    let output_format = cli.format.parse::<OutputFormat>()?;
    let root = config.resolve_root(cli.root)?;
    tracing::debug!("Using registry root {}", root.display());

    let registry = open_registry(root)?;
    execute_command(cli.command, &registry, output_format)
}
