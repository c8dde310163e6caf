//! Output formatters for CLI commands.
//!
//! Every command result goes through [`format_output`], so all commands share
//! the JSON, text and pretty renderings.

use crate::output::OutputFormat;
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

/// Format data according to the specified output format.
///
/// # Errors
///
/// Returns an error if serialization fails.
///
/// # Examples
///
/// ```
/// use plugreg_cli::formatters::format_output;
/// use plugreg_cli::output::OutputFormat;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Entry {
///     name: String,
///     enabled: bool,
/// }
///
/// let entry = Entry {
///     name: "foo".to_string(),
///     enabled: true,
/// };
///
/// let output = format_output(&entry, OutputFormat::Text)?;
/// assert!(output.lines().any(|line| line == "name=foo"));
/// assert!(output.lines().any(|line| line == "enabled=true"));
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn format_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json::format(data),
        OutputFormat::Text => text::format(data),
        OutputFormat::Pretty => pretty::format(data),
    }
}

/// JSON output formatting.
pub mod json {
    use super::{Result, Serialize};

    /// Format data as JSON with 2-space indentation.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }
}

/// Plain text output formatting.
pub mod text {
    use super::{Result, Serialize, Value};

    /// Format data as `key=value` lines.
    ///
    /// Nested fields use dotted keys and array elements their index, e.g.
    /// `plugins.0.name=foo`. Strings are printed unquoted.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        let value = serde_json::to_value(data)?;
        let mut lines = Vec::new();
        flatten(&value, "", &mut lines);
        Ok(lines.join("\n"))
    }

    fn flatten(value: &Value, key: &str, lines: &mut Vec<String>) {
        let child = |name: &str| {
            if key.is_empty() {
                name.to_string()
            } else {
                format!("{key}.{name}")
            }
        };

        match value {
            Value::Object(obj) if !obj.is_empty() => {
                for (name, val) in obj {
                    flatten(val, &child(name), lines);
                }
            }
            Value::Array(arr) if !arr.is_empty() => {
                for (i, val) in arr.iter().enumerate() {
                    flatten(val, &child(&i.to_string()), lines);
                }
            }
            Value::String(s) => lines.push(format!("{key}={s}")),
            other => lines.push(format!("{key}={other}")),
        }
    }
}

/// Pretty (human-readable) output formatting.
pub mod pretty {
    use super::{Colorize, Result, Serialize, Value};

    /// Format data as colorized, indented output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        let value = serde_json::to_value(data)?;
        let mut out = String::new();
        write_value(&value, 0, &mut out);
        Ok(out.trim_end().to_string())
    }

    fn scalar(value: &Value) -> String {
        match value {
            Value::Null => "-".dimmed().to_string(),
            Value::Bool(true) => "yes".green().to_string(),
            Value::Bool(false) => "no".red().to_string(),
            Value::Number(n) => n.to_string().cyan().to_string(),
            Value::String(s) => s.clone(),
            Value::Array(arr) if arr.is_empty() => "(none)".dimmed().to_string(),
            Value::Object(_) | Value::Array(_) => String::new(),
        }
    }

    const fn is_nested(value: &Value) -> bool {
        match value {
            Value::Object(_) => true,
            Value::Array(arr) => !arr.is_empty(),
            _ => false,
        }
    }

    fn write_value(value: &Value, indent: usize, out: &mut String) {
        let pad = "  ".repeat(indent);

        match value {
            Value::Object(obj) => {
                for (key, val) in obj {
                    let label = format!("{key}:").blue().bold();
                    if is_nested(val) {
                        out.push_str(&format!("{pad}{label}\n"));
                        write_value(val, indent + 1, out);
                    } else {
                        out.push_str(&format!("{pad}{label} {}\n", scalar(val)));
                    }
                }
            }
            Value::Array(arr) => {
                for item in arr {
                    if is_nested(item) {
                        out.push_str(&format!("{pad}{}\n", "-".dimmed()));
                        write_value(item, indent + 1, out);
                    } else {
                        out.push_str(&format!("{pad}{} {}\n", "-".dimmed(), scalar(item)));
                    }
                }
            }
            other => out.push_str(&format!("{pad}{}\n", scalar(other))),
        }
    }
}
