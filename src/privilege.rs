//! Root privilege check.
//!
//! Bootstrapping and chrooting need root, so the build refuses to start
//! unless the effective user id is 0.

use crate::error::BuilderError;

/// Effective user id of the current process.
pub fn current_euid() -> u32 {
    rustix::process::geteuid().as_raw()
}

/// Fails with [`BuilderError::PrivilegeRequired`] unless `euid` is root.
pub fn ensure_root(euid: u32) -> Result<(), BuilderError> {
    if euid == 0 {
        Ok(())
    } else {
        Err(BuilderError::PrivilegeRequired { euid })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_accepted() {
        assert!(ensure_root(0).is_ok());
    }

    #[test]
    fn non_root_is_rejected() {
        let err = ensure_root(1000).unwrap_err();
        assert!(matches!(err, BuilderError::PrivilegeRequired { euid: 1000 }));
    }
}
