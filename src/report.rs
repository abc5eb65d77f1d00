//! User-facing build report.
//!
//! Progress lines, the final summary and the privilege message are written to
//! a caller-supplied writer (stdout in the binary), separate from the
//! `tracing` log stream on stderr.

use std::fs;
use std::io::{self, Write};

use camino::Utf8Path;

const BANNER_RULE: &str = "==========================================";

/// Bytes per reported megabyte.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Formats a byte count as binary megabytes with two decimals, e.g. "700.00 MB".
pub fn format_size(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / BYTES_PER_MB)
}

/// Formats the line shown before a step runs: `[k/n] p% message`.
pub fn progress_line(step: usize, total: usize, message: &str) -> String {
    let percent = if total == 0 {
        0.0
    } else {
        step as f64 / total as f64 * 100.0
    };
    format!("[{}/{}] {:.0}% {}", step, total, percent, message)
}

/// Writes build progress and outcome messages.
pub struct Reporter<W: Write> {
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn progress(&mut self, step: usize, total: usize, message: &str) -> io::Result<()> {
        writeln!(self.out, "{}", progress_line(step, total, message))?;
        self.out.flush()
    }

    /// Prints the success banner, the output path and, when the file can be
    /// read, its size and a hint for writing it to a USB stick.
    pub fn success(&mut self, distro_name: &str, output_iso: &Utf8Path) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", BANNER_RULE)?;
        writeln!(self.out, "  {} ISO built successfully", distro_name)?;
        writeln!(self.out, "{}", BANNER_RULE)?;
        writeln!(self.out, "ISO file: {}", output_iso)?;

        if let Ok(meta) = fs::metadata(output_iso) {
            writeln!(self.out, "Size: {}", format_size(meta.len()))?;
            writeln!(self.out)?;
            writeln!(self.out, "To write the image to a USB drive:")?;
            writeln!(
                self.out,
                "  sudo dd if=\"{}\" of=/dev/sdX bs=4M status=progress && sync",
                output_iso
            )?;
        }
        self.out.flush()
    }

    pub fn failure(&mut self, step: usize, name: &str) -> io::Result<()> {
        writeln!(self.out, "Error at step {}: {}", step, name)?;
        self.out.flush()
    }

    /// Explains that the build needs root and how to rerun it.
    pub fn privilege_denied(&mut self, program: &str) -> io::Result<()> {
        writeln!(self.out, "This program must be run with root privileges.")?;
        writeln!(self.out, "Use: sudo {}", program)?;
        self.out.flush()
    }
}
