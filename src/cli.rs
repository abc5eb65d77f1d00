use std::io::Write;

use camino::Utf8PathBuf;
use clap::{CommandFactory, Parser, ValueEnum};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
)]
pub struct Cli {
    /// Echo every invoked command before running it
    #[arg(short, long)]
    pub verbose: bool,

    /// Remove the work directory before building
    #[arg(short = 'c', long = "clean")]
    pub clean: bool,

    /// Load settings from a saved configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Write the effective configuration to a file and exit
    #[arg(long, value_name = "FILE")]
    pub save_config: Option<Utf8PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub print_config: bool,

    /// Check that every required host tool is installed before building
    #[arg(long)]
    pub check_deps: bool,

    /// Set the log level
    #[arg(short, long, default_value = "info")]
    pub log_level: LogLevel,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

/// Represents log levels for controlling the verbosity of logging output.
///
/// Maps directly to the levels of the `tracing` crate. For example,
/// `--log-level debug` also shows every command line before it runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

pub fn parse_args() -> Result<Cli, clap::Error> {
    Cli::try_parse()
}

/// Exit code for a parse error: 0 when help or version was requested, 1 otherwise.
pub fn parse_error_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() { 1 } else { 0 }
}

/// Writes completions for `shell` to `out`.
pub fn write_completions(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, env!("CARGO_PKG_NAME"), out);
}
