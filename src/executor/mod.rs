//! Command execution abstraction for luna-builder.
//!
//! This module provides:
//! - [`CommandSpec`]: Typed description of an external command
//! - [`ExecutionResult`]: Result of command execution
//! - [`CommandExecutor`]: Trait for command execution strategies
//! - [`RealCommandExecutor`]: Production implementation using `std::process::Command`
//! - [`run_checked`] / [`run_best_effort`]: map an exit status to success or failure

mod real;

use std::fmt;
use std::process::ExitStatus;

use anyhow::Result;
use camino::Utf8PathBuf;
use tracing::warn;

use crate::error::BuilderError;

pub use real::RealCommandExecutor;

/// Quotes a single argument for display if it contains shell-significant characters.
fn display_arg(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=+,:@%".contains(c))
    {
        arg.to_string()
    } else {
        format!("{:?}", arg)
    }
}

/// Specification for a command to be executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// The program to execute (e.g., "mksquashfs")
    pub command: String,
    /// Command arguments, passed to the program without shell interpretation
    pub args: Vec<String>,
    /// Working directory (optional, defaults to current directory)
    pub cwd: Option<Utf8PathBuf>,
    /// Environment variables to set (in addition to inherited environment)
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Creates a new CommandSpec with command and args
    #[must_use]
    pub fn new<I, S>(command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            env: Vec::new(),
        }
    }

    /// Sets the working directory
    #[must_use]
    pub fn with_cwd(mut self, cwd: Utf8PathBuf) -> Self {
        self.cwd = Some(cwd);
        self
    }

    /// Adds an environment variable
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Renders the command as a single line, quoting arguments that need it.
    ///
    /// This is the text echoed in verbose mode and used in error messages.
    pub fn command_line(&self) -> String {
        std::iter::once(display_arg(&self.command))
            .chain(self.args.iter().map(|a| display_arg(a)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Result of command execution
#[derive(Debug)]
pub struct ExecutionResult {
    /// Exit status of the command
    pub status: ExitStatus,
}

impl ExecutionResult {
    /// Returns true if the command exited with status 0.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Returns the exit code if the process was not killed by a signal
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }
}

/// Trait for command execution.
///
/// Implementations block until the spawned process exits.
pub trait CommandExecutor: Send + Sync {
    /// Executes a command with the given specification.
    ///
    /// Returns `Err` only when the process could not be started or waited on;
    /// a non-zero exit is reported through [`ExecutionResult::status`].
    fn execute(&self, spec: &CommandSpec) -> Result<ExecutionResult>;

    /// Returns true if `command` can be found on the search path.
    fn command_exists(&self, command: &str) -> bool {
        which::which(command).is_ok()
    }
}

/// Executes `spec` and converts a spawn failure or non-zero exit into
/// [`BuilderError::Execution`].
pub fn run_checked(executor: &dyn CommandExecutor, spec: &CommandSpec) -> Result<()> {
    let result = executor.execute(spec).map_err(|e| BuilderError::Execution {
        command: spec.command_line(),
        status: format!("{:#}", e),
    })?;

    if !result.success() {
        return Err(BuilderError::Execution {
            command: spec.command_line(),
            status: result.status.to_string(),
        }
        .into());
    }

    Ok(())
}

/// Executes `spec`, logging a failure instead of returning it.
///
/// Returns whether the command succeeded.
pub fn run_best_effort(executor: &dyn CommandExecutor, spec: &CommandSpec) -> bool {
    match run_checked(executor, spec) {
        Ok(()) => true,
        Err(e) => {
            warn!("{:#}", e);
            false
        }
    }
}
