//! Image file preparation stage.
//!
//! Copies the kernel and initial ramdisk out of the chroot and compresses
//! the chroot into `filesystem.squashfs`.
//!
//! Discovery walks `<chroot>/boot` with entries sorted by file name and takes
//! the first regular file whose name matches. With several kernels installed
//! this is the lexicographically smallest name, which is not necessarily the
//! newest version.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::StageContext;
use crate::error::BuilderError;
use crate::executor::{CommandSpec, run_checked};

/// Name of the compressed root filesystem inside the image and casper directories.
pub const SQUASHFS_NAME: &str = "filesystem.squashfs";

/// A boot file to locate in the chroot and its name in the image directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootArtifact {
    /// Glob-style pattern shown in messages.
    pub pattern: &'static str,
    /// Anchored regex equivalent of `pattern`.
    regex: &'static str,
    /// File name in the image directory.
    pub target: &'static str,
}

pub const KERNEL: BootArtifact = BootArtifact {
    pattern: "vmlinuz-*",
    regex: r"^vmlinuz-.*$",
    target: "vmlinuz",
};

pub const INITRD: BootArtifact = BootArtifact {
    pattern: "initrd.img-*",
    regex: r"^initrd\.img-.*$",
    target: "initrd",
};

impl BootArtifact {
    /// Finds the first matching file under `dir`.
    pub fn find_in(&self, dir: &Utf8Path) -> Result<Utf8PathBuf> {
        let regex = Regex::new(self.regex)
            .with_context(|| format!("invalid pattern for {}", self.pattern))?;
        find_first(dir, &regex).ok_or_else(|| {
            BuilderError::Discovery {
                pattern: self.pattern.to_string(),
                dir: dir.to_string(),
            }
            .into()
        })
    }
}

/// Returns the first regular file under `dir` whose name matches `regex`,
/// walking in file-name order.
pub fn find_first(dir: &Utf8Path, regex: &Regex) -> Option<Utf8PathBuf> {
    WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("skipping unreadable entry under {}: {}", dir, e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_str().is_some_and(|name| regex.is_match(name)))
        .find_map(|entry| Utf8PathBuf::from_path_buf(entry.into_path()).ok())
}

/// Builds the `mksquashfs` invocation for the chroot tree.
pub fn squashfs_command(chroot: &Utf8Path, image_dir: &Utf8Path) -> CommandSpec {
    CommandSpec::new(
        "mksquashfs",
        [
            chroot.as_str(),
            image_dir.join(SQUASHFS_NAME).as_str(),
            "-comp",
            "xz",
            "-b",
            "1M",
            "-noappend",
        ],
    )
}

/// Stage 7: copies the kernel and initrd into the image directory and
/// builds the squashfs image of the chroot.
pub fn prepare_image_files(ctx: &StageContext<'_>) -> Result<()> {
    let paths = &ctx.config.paths;
    let boot_dir = paths.chroot().join("boot");

    for artifact in [KERNEL, INITRD] {
        let source = artifact.find_in(&boot_dir)?;
        info!("using {} for {}", source, artifact.target);
        let target = paths.image().join(artifact.target);
        run_checked(ctx.executor, &CommandSpec::new("cp", [source.as_str(), target.as_str()]))
            .with_context(|| format!("failed to copy {} to {}", source, target))?;
    }

    info!("creating squashfs image of {}", paths.chroot());
    run_checked(ctx.executor, &squashfs_command(paths.chroot(), paths.image()))
        .context("failed to create squashfs image")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn utf8_tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
        let temp = tempfile::tempdir().expect("failed to create temp dir");
        let path = Utf8PathBuf::from_path_buf(temp.path().to_path_buf())
            .expect("path should be valid UTF-8");
        (temp, path)
    }

    #[test]
    fn regexes_compile_and_match_patterns() {
        for (artifact, name) in [(KERNEL, "vmlinuz-5.15.0-91-generic"), (INITRD, "initrd.img-5.15.0")] {
            let regex = Regex::new(artifact.regex).unwrap();
            assert!(regex.is_match(name));
        }
        let initrd = Regex::new(INITRD.regex).unwrap();
        assert!(!initrd.is_match("initrdXimg-5.15.0"));
        assert!(!initrd.is_match("old-initrd.img-5.15.0"));
    }

    #[test]
    fn find_first_ignores_directories_and_symlinks() {
        let (_temp, dir) = utf8_tempdir();
        fs::create_dir(dir.join("vmlinuz-dir")).unwrap();
        fs::write(dir.join("vmlinuz-6.1.0"), "kernel").unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink(dir.join("vmlinuz-6.1.0"), dir.join("vmlinuz-0-link")).unwrap();

        let regex = Regex::new(KERNEL.regex).unwrap();
        assert_eq!(find_first(&dir, &regex), Some(dir.join("vmlinuz-6.1.0")));
    }

    #[test]
    fn find_in_missing_dir_is_discovery_error() {
        let (_temp, dir) = utf8_tempdir();
        let err = KERNEL.find_in(&dir.join("boot")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuilderError>(),
            Some(BuilderError::Discovery { .. })
        ));
    }

    #[test]
    fn squashfs_command_args() {
        let spec = squashfs_command(Utf8Path::new("/w/chroot"), Utf8Path::new("/w/image"));
        assert_eq!(
            spec.command_line(),
            "mksquashfs /w/chroot /w/image/filesystem.squashfs -comp xz -b 1M -noappend"
        );
    }
}
