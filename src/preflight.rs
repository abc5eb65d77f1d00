//! Host tool presence checks.
//!
//! By default tools are checked late: the bootstrap tool right before the
//! bootstrap stage and `xorriso` right before ISO creation. The remaining
//! tools are only caught by their own command failing. [`check_all`] runs the
//! full check upfront when `--check-deps` is given.

use anyhow::Result;
use tracing::{debug, error};

use crate::error::BuilderError;
use crate::executor::CommandExecutor;

/// Every external tool the build invokes, with the package providing it.
pub const REQUIRED_TOOLS: &[(&str, &str)] = &[
    ("mmdebstrap", "mmdebstrap"),
    ("mksquashfs", "squashfs-tools"),
    ("xorriso", "xorriso"),
    ("grub-mkrescue", "grub-common"),
    ("chroot", "coreutils"),
];

/// Returns the package that provides `tool`, defaulting to the tool name.
pub fn package_for(tool: &str) -> &str {
    REQUIRED_TOOLS
        .iter()
        .find(|(name, _)| *name == tool)
        .map(|(_, package)| *package)
        .unwrap_or(tool)
}

/// Fails with [`BuilderError::ToolMissing`] if `tool` is not on the search path.
pub fn require_tool(executor: &dyn CommandExecutor, tool: &str) -> Result<(), BuilderError> {
    if executor.command_exists(tool) {
        debug!("found required tool: {}", tool);
        Ok(())
    } else {
        Err(BuilderError::ToolMissing {
            tool: tool.to_string(),
            package: package_for(tool).to_string(),
        })
    }
}

/// Returns the subset of [`REQUIRED_TOOLS`] that is missing.
pub fn missing_tools(executor: &dyn CommandExecutor) -> Vec<&'static str> {
    REQUIRED_TOOLS
        .iter()
        .filter(|(tool, _)| !executor.command_exists(tool))
        .map(|(tool, _)| *tool)
        .collect()
}

/// Checks every required tool, logging each one that is missing.
pub fn check_all(executor: &dyn CommandExecutor) -> Result<()> {
    let missing = missing_tools(executor);
    for tool in &missing {
        error!("dependency not found: {} (apt install {})", tool, package_for(tool));
    }
    if missing.is_empty() {
        return Ok(());
    }
    Err(BuilderError::ToolMissing {
        tool: missing.join(", "),
        package: missing
            .iter()
            .map(|t| package_for(t))
            .collect::<Vec<_>>()
            .join(" "),
    }
    .into())
}
