//! Output format selection and process exit codes.

use plugreg_store::RegistryError;
use std::fmt;
use std::str::FromStr;

/// CLI output format.
///
/// All formats carry the same information with different presentation.
///
/// # Examples
///
/// ```
/// use plugreg_cli::output::OutputFormat;
///
/// let format: OutputFormat = "json".parse().unwrap();
/// assert_eq!(format, OutputFormat::Json);
/// assert_eq!(format.as_str(), "json");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// Indented JSON for machine parsing
    Json,
    /// `key=value` lines for scripts
    Text,
    /// Colorized output for human reading
    #[default]
    Pretty,
}

impl OutputFormat {
    /// Returns the string representation of the format.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
            Self::Pretty => "pretty",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            "pretty" => Ok(Self::Pretty),
            _ => anyhow::bail!("invalid output format: '{s}' (expected: json, text, or pretty)"),
        }
    }
}

/// Process exit code with semantic meaning.
///
/// # Examples
///
/// ```
/// use plugreg_cli::output::ExitCode;
///
/// assert!(ExitCode::SUCCESS.is_success());
/// assert_eq!(ExitCode::NOT_FOUND.as_i32(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Successful execution.
    pub const SUCCESS: Self = Self(0);

    /// File-system or other system failure.
    pub const ERROR: Self = Self(1);

    /// Invalid arguments, configuration or image.
    pub const INVALID_INPUT: Self = Self(2);

    /// The named plugin is not installed.
    pub const NOT_FOUND: Self = Self(3);

    /// A plugin with that name is already installed.
    pub const CONFLICT: Self = Self(4);

    /// Installed files are missing, corrupt or modified.
    pub const INTEGRITY: Self = Self(5);

    /// Returns the exit code as an integer.
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }

    /// Checks if the exit code represents success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.0 == 0
    }

    /// Maps a registry error to the exit code reported for it.
    #[must_use]
    pub const fn for_registry_error(error: &RegistryError) -> Self {
        match error {
            RegistryError::NotFound { .. } => Self::NOT_FOUND,
            RegistryError::AlreadyInstalled { .. } => Self::CONFLICT,
            RegistryError::NotAPlugin { .. }
            | RegistryError::Load { .. }
            | RegistryError::InvalidName { .. }
            | RegistryError::InvalidManifest { .. }
            | RegistryError::Config { .. } => Self::INVALID_INPUT,
            RegistryError::InvalidMetadata { .. }
            | RegistryError::MissingFile { .. }
            | RegistryError::ChecksumMismatch { .. } => Self::INTEGRITY,
            RegistryError::Install { .. } | RegistryError::Io(_) | RegistryError::Json(_) => {
                Self::ERROR
            }
        }
    }

    /// Maps any command error to an exit code.
    ///
    /// Registry errors anywhere in the chain decide the code; anything else
    /// is a general error.
    #[must_use]
    pub fn for_error(error: &anyhow::Error) -> Self {
        error
            .chain()
            .find_map(|cause| cause.downcast_ref::<RegistryError>())
            .map_or(Self::ERROR, Self::for_registry_error)
    }
}

impl Default for ExitCode {
    fn default() -> Self {
        Self::SUCCESS
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
