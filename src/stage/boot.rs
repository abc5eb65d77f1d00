//! Live-boot tree assembly.

use std::fmt::Write as _;
use std::fs;

use anyhow::{Context, Result};
use camino::Utf8Path;
use tracing::info;

use super::StageContext;
use super::directories::ensure_dir;
use super::image::SQUASHFS_NAME;
use crate::config::BuildConfig;
use crate::error::BuilderError;
use crate::executor::{CommandSpec, run_checked};

/// Seconds the boot menu waits before starting the default entry.
pub const MENU_TIMEOUT: u32 = 30;

const LIVE_KERNEL: &str = "/casper/vmlinuz";
const LIVE_INITRD: &str = "/casper/initrd";

struct MenuEntry {
    title: String,
    body: Vec<String>,
}

impl MenuEntry {
    fn live(title: String, options: &str) -> Self {
        Self {
            title,
            body: vec![
                format!("linux {} boot=casper {} ---", LIVE_KERNEL, options),
                format!("initrd {}", LIVE_INITRD),
            ],
        }
    }
}

/// Renders `boot/grub/grub.cfg`: live, safe-graphics and install entries
/// followed by a chainload of the first hard disk.
pub fn grub_menu(config: &BuildConfig) -> String {
    let name = &config.identity.name;
    let entries = [
        MenuEntry::live(
            format!("Start {} Live (Wayland)", name),
            "noprompt quiet splash",
        ),
        MenuEntry::live(
            format!("Start {} Live (Safe Graphics)", name),
            "nomodeset quiet splash",
        ),
        MenuEntry::live(
            format!("Install {}", name),
            "noprompt only-ubiquity quiet splash",
        ),
        MenuEntry {
            title: "Boot from first hard disk".to_string(),
            body: vec!["set root=(hd0)".to_string(), "chainloader +1".to_string()],
        },
    ];

    let mut out = format!("set timeout={}\nset default=0\n", MENU_TIMEOUT);
    for entry in &entries {
        // Writing to a String can't fail.
        let _ = write!(out, "\nmenuentry \"{}\" {{\n", entry.title);
        for line in &entry.body {
            let _ = writeln!(out, "    {}", line);
        }
        out.push_str("}\n");
    }
    out
}

/// Renders `.disk/info`, e.g. "Luna Linux Stellar 1.0 amd64".
pub fn disk_info(config: &BuildConfig) -> String {
    let id = &config.identity;
    format!(
        "{} {} {} {}\nBased on {} {} LTS\n",
        id.name,
        id.display_codename(),
        id.version,
        id.arch,
        id.display_base_name(),
        id.base_version
    )
}

fn write_text(path: &Utf8Path, content: &str) -> Result<(), BuilderError> {
    fs::write(path, content).map_err(|e| BuilderError::io(format!("failed to write {}", path), e))
}

/// Stage 8: lays out the casper tree under the iso directory and writes the
/// boot menu and disk information files.
pub fn create_boot_structure(ctx: &StageContext<'_>) -> Result<()> {
    let paths = &ctx.config.paths;
    let iso = paths.iso();
    let grub_dir = iso.join("boot").join("grub");
    let casper = iso.join("casper");
    let disk = iso.join(".disk");

    for dir in [&grub_dir, &casper, &disk] {
        ensure_dir(dir)?;
    }

    for name in ["vmlinuz", "initrd", SQUASHFS_NAME] {
        let source = paths.image().join(name);
        run_checked(ctx.executor, &CommandSpec::new("cp", [source.as_str(), casper.as_str()]))
            .with_context(|| format!("failed to copy {} into {}", source, casper))?;
    }

    let grub_cfg = grub_dir.join("grub.cfg");
    write_text(&grub_cfg, &grub_menu(ctx.config))?;
    info!("wrote boot menu to {}", grub_cfg);

    write_text(&disk.join("info"), &disk_info(ctx.config))?;
    Ok(())
}
