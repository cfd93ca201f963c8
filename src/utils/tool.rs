//! External tool invocation.
//!
//! Wraps subprocess calls behind a structured result so callers decide
//! what a failure means: a renderer failure fails the unit, a validator
//! failure is logged and the build continues.

use anyhow::{Context, Result};
use regex::Regex;
use std::{
    ffi::OsString,
    path::Path,
    process::Command,
    sync::OnceLock,
};

/// Outcome of a finished external tool.
pub struct ToolOutput {
    /// Whether the tool exited with status zero.
    pub succeeded: bool,
    /// Combined stdout + stderr, ANSI escapes stripped.
    pub output: String,
}

impl ToolOutput {
    /// Convert a failed run into an error carrying the tool output.
    pub fn into_result(self, name: &str) -> Result<Self> {
        if self.succeeded {
            Ok(self)
        } else {
            anyhow::bail!("`{name}` failed:\n{}", self.output.trim())
        }
    }
}

/// Run an external tool and capture its output.
///
/// `command` is the configured argv prefix (e.g. `["pandoc"]`), `args`
/// the per-invocation arguments. A non-zero exit is not an error here;
/// it is reported through [`ToolOutput::succeeded`]. Only a failure to
/// spawn the process at all is an `Err`.
pub fn run(root: Option<&Path>, command: &[String], args: &[OsString]) -> Result<ToolOutput> {
    let name = command.first().context("Empty tool command")?;

    let mut cmd = Command::new(name);
    cmd.args(&command[1..]).args(args.iter().filter(|a| !a.is_empty()));
    if let Some(dir) = root {
        cmd.current_dir(dir);
    }

    let output = cmd
        .output()
        .with_context(|| format!("Failed to execute `{name}`"))?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        if !combined.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(&stderr);
    }

    Ok(ToolOutput {
        succeeded: output.status.success(),
        output: strip_ansi(&combined).into_owned(),
    })
}

/// Convenience for string args.
pub fn to_args<I, S>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    args.into_iter().map(Into::into).collect()
}

/// Remove ANSI color escapes from tool output before it lands in logs.
pub fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());
    re.replace_all(s, "")
}
