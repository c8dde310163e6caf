//! plugreg CLI library.
//!
//! Argument parsing, configuration, command handlers and output formatting
//! for the `plugreg` binary, exposed as a library so they can be tested.

#![allow(clippy::format_push_string)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod formatters;
pub mod output;
pub mod runner;

pub use cli::{Cli, Commands};
pub use output::{ExitCode, OutputFormat};
