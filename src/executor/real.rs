//! Real command executor implementation.
//!
//! This module provides [`RealCommandExecutor`], which executes commands
//! using `std::process::Command` with the child inheriting the terminal.

use std::process::Command;

use anyhow::{Context, Result};

use super::{CommandExecutor, CommandSpec, ExecutionResult};

/// Command executor that runs actual system commands.
///
/// When `verbose` is true, each command line is echoed at INFO level before
/// it runs; otherwise it is logged at DEBUG level.
#[derive(Debug, Default, Clone)]
pub struct RealCommandExecutor {
    pub verbose: bool,
}

impl RealCommandExecutor {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl CommandExecutor for RealCommandExecutor {
    fn execute(&self, spec: &CommandSpec) -> Result<ExecutionResult> {
        if self.verbose {
            tracing::info!("executing: {}", spec.command_line());
        } else {
            tracing::debug!("executing: {}", spec.command_line());
        }

        let mut command = Command::new(&spec.command);
        command.args(&spec.args);

        if let Some(ref cwd) = spec.cwd {
            command.current_dir(cwd);
        }

        for (key, value) in &spec.env {
            command.env(key, value);
        }

        let mut child = command.spawn().with_context(|| {
            format!("failed to spawn command `{}` with args {:?}", spec.command, spec.args)
        })?;

        tracing::trace!("spawned command: {}: pid={}", spec.command, child.id());

        let status = child
            .wait()
            .with_context(|| format!("failed to wait for command `{}`", spec.command))?;

        tracing::trace!("executed command: {}: success={}", spec.command, status.success());

        Ok(ExecutionResult { status })
    }
}
