//! ISO mastering with xorriso.

use anyhow::{Context, Result};
use tracing::info;

use super::StageContext;
use crate::bootstrap::{CommandArgsBuilder, FlagValueStyle};
use crate::config::BuildConfig;
use crate::executor::{CommandSpec, run_checked};
use crate::preflight::require_tool;

pub const ISO_TOOL: &str = "xorriso";

/// BIOS El Torito boot image, relative to the iso directory.
pub const BIOS_BOOT_IMAGE: &str = "boot/grub/bios.img";

/// EFI boot image, relative to the iso directory.
pub const EFI_BOOT_IMAGE: &str = "boot/grub/efi.img";

/// Builds the hybrid BIOS/UEFI `xorriso -as mkisofs` invocation.
pub fn iso_command(config: &BuildConfig) -> CommandSpec {
    let paths = &config.paths;
    let mut builder = CommandArgsBuilder::new();
    builder.push_flag("-as");
    builder.push_arg("mkisofs");
    builder.push_flag_value("-volid", &config.identity.name, FlagValueStyle::Separate);
    builder.push_flag("-full-iso9660-filenames");
    builder.push_flag("-joliet");
    builder.push_flag("-rational-rock");
    builder.push_flag_value("-iso-level", "3", FlagValueStyle::Separate);
    builder.push_flag_value("-eltorito-boot", BIOS_BOOT_IMAGE, FlagValueStyle::Separate);
    builder.push_flag("-no-emul-boot");
    builder.push_flag_value("-boot-load-size", "4", FlagValueStyle::Separate);
    builder.push_flag("-boot-info-table");
    builder.push_flag_value("--efi-boot", EFI_BOOT_IMAGE, FlagValueStyle::Separate);
    builder.push_flag("-efi-boot-part");
    builder.push_flag("--efi-boot-image");
    builder.push_flag("--protective-msdos-label");
    builder.push_flag("-isohybrid-gpt-basdat");
    builder.push_flag_value("-o", paths.output_iso().as_str(), FlagValueStyle::Separate);
    builder.push_arg(paths.iso());

    CommandSpec::new(ISO_TOOL, builder.into_args())
}

/// Stage 9: masters the iso directory into the output image.
pub fn create_iso_image(ctx: &StageContext<'_>) -> Result<()> {
    require_tool(ctx.executor, ISO_TOOL)?;

    let output = ctx.config.paths.output_iso();
    info!("writing ISO image to {}", output);
    run_checked(ctx.executor, &iso_command(ctx.config))
        .with_context(|| format!("failed to create ISO image {}", output))
}
