//! Command handlers.
//!
//! Each handler runs one registry operation and returns a serializable
//! [`Outcome`] for the formatter.

use crate::cli::Commands;
use anyhow::{Context, Result};
use plugreg_store::{Manifest, Registry, Transition};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Result of a command, ready to be formatted.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    /// A plugin was installed.
    Installed(InstallResult),
    /// A plugin was removed.
    Uninstalled(UninstallResult),
    /// Installed plugins.
    Listed(ListResult),
    /// A plugin was enabled or disabled.
    Toggled(ToggleResult),
    /// Manifest of an image or installed plugin.
    Inspected(Manifest),
    /// Installed files passed verification.
    Verified(VerifyResult),
}

/// Result of installing a plugin.
#[derive(Debug, Serialize)]
pub struct InstallResult {
    /// Registered name
    pub name: String,
    /// Whether the plugin is enabled
    pub enabled: bool,
    /// Directory holding the installed files
    pub install_dir: PathBuf,
}

/// Result of uninstalling a plugin.
#[derive(Debug, Serialize)]
pub struct UninstallResult {
    /// Plugin name
    pub name: String,
    /// Whether the plugin was removed
    pub removed: bool,
}

/// Result of listing plugins.
#[derive(Debug, Serialize)]
pub struct ListResult {
    /// Registry root
    pub root: PathBuf,
    /// Number of plugins found
    pub plugin_count: usize,
    /// Installed plugins, sorted by name
    pub plugins: Vec<PluginSummary>,
    /// Metadata files that could not be read
    pub skipped: Vec<SkippedSummary>,
}

/// One installed plugin in a listing.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PluginSummary {
    /// Plugin name
    pub name: String,
    /// Whether the plugin is enabled
    pub enabled: bool,
}

/// A metadata file skipped by a listing.
#[derive(Debug, Serialize)]
pub struct SkippedSummary {
    /// Path of the metadata file
    pub path: PathBuf,
    /// Why it was skipped
    pub error: String,
}

/// Result of enabling or disabling a plugin.
#[derive(Debug, Serialize)]
pub struct ToggleResult {
    /// Plugin name
    pub name: String,
    /// State after the command
    pub enabled: bool,
    /// Whether the stored state changed
    pub changed: bool,
    /// Informational note when nothing changed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Result of verifying a plugin.
#[derive(Debug, Serialize)]
pub struct VerifyResult {
    /// Plugin name
    pub name: String,
    /// Whether all installed files are intact
    pub intact: bool,
}

/// Runs `command` against `registry`.
///
/// # Errors
///
/// Returns the registry error of the failed operation, with context naming
/// the command.
pub fn run(command: Commands, registry: &Registry) -> Result<Outcome> {
    match command {
        Commands::Install { image, name } => {
            install(registry, &image, name.as_deref()).map(Outcome::Installed)
        }
        Commands::Uninstall { name } => uninstall(registry, &name).map(Outcome::Uninstalled),
        Commands::List => list(registry).map(Outcome::Listed),
        Commands::Enable { name } => toggle(registry, &name, true).map(Outcome::Toggled),
        Commands::Disable { name } => toggle(registry, &name, false).map(Outcome::Toggled),
        Commands::Inspect { target } => registry
            .inspect(&target)
            .map(Outcome::Inspected)
            .with_context(|| format!("failed to inspect '{target}'")),
        Commands::Verify { name } => verify(registry, &name).map(Outcome::Verified),
    }
}

fn install(registry: &Registry, image: &Path, name: Option<&str>) -> Result<InstallResult> {
    info!("Installing plugin image {}", image.display());

    let meta = registry
        .install(image, name)
        .with_context(|| format!("failed to install '{}'", image.display()))?;

    Ok(InstallResult {
        install_dir: meta.install_dir(),
        name: meta.name,
        enabled: meta.enabled,
    })
}

fn uninstall(registry: &Registry, name: &str) -> Result<UninstallResult> {
    registry
        .uninstall(name)
        .with_context(|| format!("failed to uninstall plugin '{name}'"))?;

    Ok(UninstallResult {
        name: name.to_string(),
        removed: true,
    })
}

fn list(registry: &Registry) -> Result<ListResult> {
    let report = registry
        .list()
        .with_context(|| format!("failed to list plugins in {}", registry.root().display()))?;

    let mut plugins: Vec<_> = report
        .plugins
        .into_iter()
        .map(|meta| PluginSummary {
            name: meta.name,
            enabled: meta.enabled,
        })
        .collect();
    plugins.sort_by(|a, b| a.name.cmp(&b.name));

    let skipped = report
        .skipped
        .into_iter()
        .map(|entry| SkippedSummary {
            path: entry.path,
            error: entry.error.to_string(),
        })
        .collect();

    Ok(ListResult {
        root: registry.root().to_path_buf(),
        plugin_count: plugins.len(),
        plugins,
        skipped,
    })
}

fn toggle(registry: &Registry, name: &str, enabled: bool) -> Result<ToggleResult> {
    let (transition, state) = if enabled {
        (registry.enable(name), "enabled")
    } else {
        (registry.disable(name), "disabled")
    };

    let transition = transition.with_context(|| {
        let verb = if enabled { "enable" } else { "disable" };
        format!("failed to {verb} plugin '{name}'")
    })?;

    let changed = transition == Transition::Applied;
    Ok(ToggleResult {
        name: name.to_string(),
        enabled,
        changed,
        note: (!changed).then(|| format!("plugin '{name}' is already {state}")),
    })
}

fn verify(registry: &Registry, name: &str) -> Result<VerifyResult> {
    registry
        .verify(name)
        .with_context(|| format!("failed to verify plugin '{name}'"))?;

    Ok(VerifyResult {
        name: name.to_string(),
        intact: true,
    })
}
