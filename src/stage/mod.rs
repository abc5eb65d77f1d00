//! Build stages.
//!
//! The build is a fixed sequence of ten [`Stage`]s. Each stage takes the
//! shared [`StageContext`] and either succeeds or returns an error; the
//! stages communicate only through the files they leave in the work
//! directory.
//!
//! ## Stage order
//!
//! 1. directory setup ([`directories`])
//! 2. base system bootstrap ([`base_system`])
//! 3. to 6. chroot configuration scripts ([`chroot_setup`])
//! 7. kernel, initrd and squashfs preparation ([`image`])
//! 8. live-boot tree assembly ([`boot`])
//! 9. ISO mastering ([`iso`])
//! 10. removal of temporary scripts ([`cleanup`])

pub mod base_system;
pub mod boot;
pub mod chroot_setup;
pub mod cleanup;
pub mod directories;
pub mod image;
pub mod iso;

use std::borrow::Cow;

use anyhow::Result;
use strum::{Display, EnumCount, EnumIter, IntoEnumIterator};

use crate::config::BuildConfig;
use crate::executor::CommandExecutor;
use crate::isolation::Isolation;

/// Everything a stage needs: the configuration and the process abstractions.
#[derive(Clone, Copy)]
pub struct StageContext<'a> {
    pub config: &'a BuildConfig,
    pub executor: &'a dyn CommandExecutor,
    pub isolation: &'a dyn Isolation,
}

impl<'a> StageContext<'a> {
    pub fn new(
        config: &'a BuildConfig,
        executor: &'a dyn CommandExecutor,
        isolation: &'a dyn Isolation,
    ) -> Self {
        Self {
            config,
            executor,
            isolation,
        }
    }
}

/// A unit of work run by the pipeline.
///
/// Implemented by [`Stage`]; tests provide their own steps.
pub trait BuildStep {
    /// Human-readable name shown in progress and failure reports.
    fn name(&self) -> Cow<'_, str>;

    /// Runs the step.
    fn run(&self, ctx: &StageContext<'_>) -> Result<()>;
}

/// The ten stages of a build, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumCount)]
pub enum Stage {
    #[strum(to_string = "Creating directory structure")]
    Directories,
    #[strum(to_string = "Building base system")]
    BaseSystem,
    #[strum(to_string = "Configuring GRUB with custom theme")]
    BootloaderTheme,
    #[strum(to_string = "Installing KDE Plasma with Wayland")]
    Desktop,
    #[strum(to_string = "Installing Calamares graphical installer")]
    Installer,
    #[strum(to_string = "Installing additional software")]
    Software,
    #[strum(to_string = "Preparing ISO files")]
    ImageFiles,
    #[strum(to_string = "Creating boot structure")]
    BootStructure,
    #[strum(to_string = "Creating ISO image")]
    IsoImage,
    #[strum(to_string = "Finishing build")]
    Cleanup,
}

impl Stage {
    /// All stages in execution order.
    pub fn all() -> Vec<Stage> {
        Stage::iter().collect()
    }
}

impl BuildStep for Stage {
    fn name(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<()> {
        match self {
            Stage::Directories => directories::create_directory_structure(ctx.config),
            Stage::BaseSystem => base_system::build_base_system(ctx),
            Stage::BootloaderTheme => chroot_setup::customize_bootloader(ctx),
            Stage::Desktop => chroot_setup::install_desktop(ctx),
            Stage::Installer => chroot_setup::install_installer(ctx),
            Stage::Software => chroot_setup::install_software(ctx),
            Stage::ImageFiles => image::prepare_image_files(ctx),
            Stage::BootStructure => boot::create_boot_structure(ctx),
            Stage::IsoImage => iso::create_iso_image(ctx),
            Stage::Cleanup => cleanup::cleanup_build(ctx.config),
        }
    }
}
