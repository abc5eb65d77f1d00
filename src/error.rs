//! Domain-specific error types for luna-builder.
//!
//! This module defines `BuilderError`, a `thiserror`-based enum covering the
//! failure modes of a build: missing host tools, failed commands, filesystem
//! errors, missing boot artifacts, bad configuration and missing privileges.
//! Stage functions return `anyhow::Result`; `BuilderError` converts into
//! `anyhow::Error` through `?` and can be recovered with `downcast_ref`.

use std::io;

/// Formats an IO error kind into a human-readable message.
///
/// Common kinds get a short fixed message (e.g. "I/O error: not found")
/// instead of the OS-level text. Other kinds fall back to the OS message.
pub(crate) fn io_error_kind_message(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => "I/O error: not found".to_string(),
        io::ErrorKind::PermissionDenied => "I/O error: permission denied".to_string(),
        io::ErrorKind::IsADirectory => "I/O error: is a directory".to_string(),
        _ => format!("I/O error: {}", err),
    }
}

/// Domain-specific error type for luna-builder.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BuilderError {
    /// A required host tool is not on the search path.
    #[error("required tool not found: {tool} (install with: apt install {package})")]
    ToolMissing {
        /// Executable name that was looked up.
        tool: String,
        /// Debian/Ubuntu package that provides it.
        package: String,
    },

    /// A command could not be spawned or exited unsuccessfully.
    #[error("command execution failed: {command}: {status}")]
    Execution {
        /// The rendered command line.
        command: String,
        /// Exit status, signal information, or the spawn error.
        status: String,
    },

    /// An I/O operation failed with contextual information.
    #[error("{context}: {message}")]
    Io {
        /// What was being done when the error occurred, usually including a path.
        context: String,
        /// Human-readable description derived from [`io_error_kind_message`].
        message: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// An expected boot artifact was not found under the chroot.
    #[error("no file matching {pattern} found under {dir}")]
    Discovery {
        /// Name pattern that was searched for (e.g. `vmlinuz-*`).
        pattern: String,
        /// Directory that was searched.
        dir: String,
    },

    /// The build configuration could not be loaded, saved or validated.
    #[error("configuration error: {0}")]
    Config(String),

    /// The process is not running with root privileges.
    #[error("root privileges are required (effective uid is {euid})")]
    PrivilegeRequired {
        /// The effective user id of the process.
        euid: u32,
    },
}

impl BuilderError {
    /// Creates an `Io` variant with `message` derived from `source`.
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            message: io_error_kind_message(&source),
            source,
        }
    }
}
