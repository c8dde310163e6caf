//! CLI argument definitions and parsing.
//!
//! Defines the command-line interface structure using clap:
//! - `Cli` - Main CLI entry point
//! - `Commands` - Available subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Plugin registry - install and manage image-packaged plugins.
#[derive(Parser, Debug)]
#[command(name = "plugreg")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Registry root directory
    ///
    /// Overrides the `root` setting of the config file.
    #[arg(long, global = true, env = "PLUGREG_ROOT")]
    pub root: Option<PathBuf>,

    /// Configuration file (default: <config dir>/plugreg/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (json, text, pretty)
    #[arg(long = "format", global = true, default_value = "pretty")]
    pub format: String,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Install a plugin image.
    ///
    /// The plugin is registered under `--name` when given, otherwise under
    /// the name declared in the image manifest. It starts enabled.
    ///
    /// # Examples
    ///
    /// ```bash
    /// plugreg install ./tool.image
    /// plugreg install ./tool.image --name vendor/tool
    /// ```
    Install {
        /// Path to the plugin image
        image: PathBuf,

        /// Name to register the plugin under
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Remove an installed plugin and its files.
    Uninstall {
        /// Plugin name
        name: String,
    },

    /// List installed plugins.
    List,

    /// Enable an installed plugin.
    Enable {
        /// Plugin name
        name: String,
    },

    /// Disable an installed plugin.
    Disable {
        /// Plugin name
        name: String,
    },

    /// Show the manifest of an image file or installed plugin.
    ///
    /// An argument naming an existing file is read as an image; anything
    /// else is looked up as an installed plugin name.
    Inspect {
        /// Image path or plugin name
        target: String,
    },

    /// Check that the files of an installed plugin are intact.
    Verify {
        /// Plugin name
        name: String,
    },
}
