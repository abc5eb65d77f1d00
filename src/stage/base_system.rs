//! Base system bootstrap stage.

use anyhow::{Context, Result};
use tracing::info;

use super::StageContext;
use crate::bootstrap::{BOOTSTRAP_TOOL, Bootstrap};
use crate::executor::run_checked;
use crate::preflight::require_tool;

/// Stage 2: checks the bootstrap tool is installed, then creates the base
/// system in the chroot directory.
pub fn build_base_system(ctx: &StageContext<'_>) -> Result<()> {
    require_tool(ctx.executor, BOOTSTRAP_TOOL)?;

    let spec = Bootstrap::new(ctx.config).command();
    info!(
        "bootstrapping {} {} into {}",
        ctx.config.identity.base_name,
        ctx.config.identity.base_codename,
        ctx.config.paths.chroot()
    );
    run_checked(ctx.executor, &spec)
        .with_context(|| format!("failed to bootstrap base system with {}", BOOTSTRAP_TOOL))
}
