//! Isolation module for executing commands inside the target root filesystem.
//!
//! An [`Isolation`] turns a command meant for the target system into a host
//! command that runs it inside the rootfs. Only `chroot` is provided.

use camino::Utf8Path;

use crate::executor::CommandSpec;

pub mod chroot;

pub use chroot::ChrootIsolation;

/// Trait for isolation backend implementations.
pub trait Isolation: Send + Sync {
    /// Returns the name of this isolation backend.
    fn name(&self) -> &'static str;

    /// Builds the host command that runs `command` inside `rootfs`.
    ///
    /// # Arguments
    /// * `rootfs` - The path to the rootfs directory
    /// * `command` - The program and arguments, as seen from inside the rootfs
    fn command(&self, rootfs: &Utf8Path, command: &[String]) -> CommandSpec;
}
