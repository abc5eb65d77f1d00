//! Removal of temporary host-side scripts.

use std::fs;
use std::io;

use anyhow::Result;
use tracing::{debug, warn};

use crate::config::BuildConfig;
use crate::scripts::ALL_SCRIPTS;

/// Stage 10: deletes the generated setup scripts from the host script
/// directory. Missing files are skipped and other failures only warn, so
/// this stage never fails the build.
///
/// Copies inside the chroot stay in place and end up in the squashfs image.
pub fn cleanup_build(config: &BuildConfig) -> Result<()> {
    let script_dir = config.paths.script_dir();
    for name in ALL_SCRIPTS {
        let path = script_dir.join(name);
        match fs::remove_file(&path) {
            Ok(()) => debug!("removed {}", path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("failed to remove {}: {}", path, e),
        }
    }
    Ok(())
}
