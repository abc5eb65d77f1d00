//! Chroot isolation implementation.

use super::Isolation;
use crate::executor::CommandSpec;
use camino::Utf8Path;

/// Chroot-based isolation backend.
///
/// Uses the standard `chroot` command to change the root directory before
/// executing commands.
#[derive(Debug, Default, Clone)]
pub struct ChrootIsolation;

impl Isolation for ChrootIsolation {
    fn name(&self) -> &'static str {
        "chroot"
    }

    fn command(&self, rootfs: &Utf8Path, command: &[String]) -> CommandSpec {
        let mut args: Vec<String> = Vec::with_capacity(command.len() + 1);
        args.push(rootfs.as_str().to_string());
        args.extend(command.iter().cloned());

        CommandSpec::new("chroot", args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_command_with_rootfs() {
        let spec = ChrootIsolation.command(
            Utf8Path::new("/work/chroot"),
            &["/bin/bash".to_string(), "/tmp/setup-grub.sh".to_string()],
        );
        assert_eq!(spec.command, "chroot");
        assert_eq!(spec.args, vec!["/work/chroot", "/bin/bash", "/tmp/setup-grub.sh"]);
        assert!(spec.env.is_empty());
    }
}
