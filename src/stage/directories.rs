//! Work directory staging.

use std::fs;
use std::io;

use anyhow::Result;
use camino::Utf8Path;
use tracing::{debug, info};

use crate::config::BuildConfig;
use crate::error::BuilderError;

/// Creates `path` (and missing parents) with mode 0755. An existing directory is not an error.
pub(crate) fn ensure_dir(path: &Utf8Path) -> Result<(), BuilderError> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }

    match builder.create(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(BuilderError::io(format!("failed to create directory: {}", path), e)),
    }
}

/// Removes the work directory tree. A missing directory is not an error.
pub fn clean_work_dir(config: &BuildConfig) -> Result<(), BuilderError> {
    let work = config.paths.work();
    if work.parent().is_none() || config.home.starts_with(work) {
        return Err(BuilderError::Config(format!("refusing to remove {}", work)));
    }
    match fs::remove_dir_all(work) {
        Ok(()) => {
            info!("removed previous build at {}", work);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("nothing to clean at {}", work);
            Ok(())
        }
        Err(e) => Err(BuilderError::io(format!("failed to remove work directory: {}", work), e)),
    }
}

/// Stage 1: ensures the work, chroot, image and iso directories exist,
/// wiping the work directory first when a clean build was requested.
pub fn create_directory_structure(config: &BuildConfig) -> Result<()> {
    if config.clean_build {
        clean_work_dir(config)?;
    }

    let paths = &config.paths;
    for dir in [paths.work(), paths.chroot(), paths.image(), paths.iso()] {
        ensure_dir(dir)?;
        debug!("directory ready: {}", dir);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn ensure_dir_rejects_regular_file() {
        let temp = tempfile::tempdir().expect("failed to create temp dir");
        let file = Utf8PathBuf::from_path_buf(temp.path().join("file"))
            .expect("path should be valid UTF-8");
        fs::write(&file, "x").expect("failed to write file");

        let err = ensure_dir(&file).unwrap_err();
        assert!(matches!(err, BuilderError::Io { .. }), "{:?}", err);
    }

    #[test]
    fn clean_work_dir_refuses_root_and_home() {
        let temp = tempfile::tempdir().expect("failed to create temp dir");
        let home = Utf8PathBuf::from_path_buf(temp.path().to_path_buf())
            .expect("path should be valid UTF-8");
        let marker = home.join("keep");
        fs::write(&marker, "x").expect("failed to write file");

        let mut config = BuildConfig::for_home(&home);
        for work in [Utf8PathBuf::from("/"), home.clone()] {
            config.paths.set_work(work.clone());
            let err = clean_work_dir(&config).unwrap_err();
            assert!(matches!(err, BuilderError::Config(_)), "{}: {:?}", work, err);
        }
        assert!(marker.is_file());
    }
}
