//! Stages that configure the target system by running scripts inside the chroot.

use anyhow::Result;

use super::StageContext;
use crate::scripts::{self, ChrootScriptRunner, ScriptResource};

fn run_script(ctx: &StageContext<'_>, script: ScriptResource) -> Result<()> {
    ChrootScriptRunner::new(ctx.executor, ctx.isolation).run(&script, &ctx.config.paths)
}

/// Stage 3: GRUB packages, theme and defaults.
pub fn customize_bootloader(ctx: &StageContext<'_>) -> Result<()> {
    run_script(ctx, scripts::grub_theme(ctx.config))
}

/// Stage 4: desktop environment, display manager and the default login user.
pub fn install_desktop(ctx: &StageContext<'_>) -> Result<()> {
    run_script(ctx, scripts::desktop(ctx.config))
}

/// Stage 5: graphical installer and branding.
pub fn install_installer(ctx: &StageContext<'_>) -> Result<()> {
    run_script(ctx, scripts::installer(ctx.config))
}

/// Stage 6: additional applications and OS identification files.
pub fn install_software(ctx: &StageContext<'_>) -> Result<()> {
    run_script(ctx, scripts::software(ctx.config))
}
