pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod isolation;
pub mod pipeline;
pub mod preflight;
pub mod privilege;
pub mod report;
pub mod scripts;
pub mod stage;

use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{FmtSubscriber, filter::LevelFilter};

use crate::config::BuildConfig;
use crate::executor::CommandExecutor;
use crate::isolation::ChrootIsolation;
use crate::pipeline::Pipeline;
use crate::report::Reporter;
use crate::stage::StageContext;

pub use crate::error::BuilderError;

/// Maps the `--log-level` choice to a filter. `-v` raises it to at least
/// INFO so the command echo is never filtered out.
pub fn log_filter(log_level: cli::LogLevel, verbose: bool) -> LevelFilter {
    let filter = match log_level {
        cli::LogLevel::Trace => LevelFilter::TRACE,
        cli::LogLevel::Debug => LevelFilter::DEBUG,
        cli::LogLevel::Info => LevelFilter::INFO,
        cli::LogLevel::Warn => LevelFilter::WARN,
        cli::LogLevel::Error => LevelFilter::ERROR,
    };
    if verbose {
        filter.max(LevelFilter::INFO)
    } else {
        filter
    }
}

pub fn init_logging(log_level: cli::LogLevel, verbose: bool) -> Result<()> {
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_max_level(log_filter(log_level, verbose))
            .with_writer(io::stderr)
            .finish(),
    )
    .context("failed to set global default tracing subscriber")
}

/// Applies the command-line settings on top of `base` and validates the result.
pub fn resolve_config(cli: &cli::Cli, mut base: BuildConfig) -> Result<BuildConfig> {
    if let Some(path) = &cli.config {
        let saved = config::saved::load(path)
            .with_context(|| format!("failed to load configuration from {}", path))?;
        base.apply_saved(saved);
    }
    base.verbose = cli.verbose;
    base.clean_build = cli.clean;
    base.validate().context("configuration validation failed")?;
    Ok(base)
}

/// Builds the configuration for the current user from the command line.
pub fn load_config(cli: &cli::Cli) -> Result<BuildConfig> {
    resolve_config(cli, BuildConfig::new()?)
}

/// Settings that affect a build run but are not part of the configuration.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Program name shown in the privilege message.
    pub program: String,
    /// Effective user id of the process.
    pub euid: u32,
    /// Check every required tool before the first stage.
    pub check_deps: bool,
}

/// Runs the full build: privilege check, optional dependency check, the
/// ten stages, and the final report.
///
/// No stage runs when the privilege check fails.
pub fn run_build<W: Write>(
    config: &BuildConfig,
    opts: &BuildOptions,
    executor: &dyn CommandExecutor,
    reporter: &mut Reporter<W>,
) -> Result<()> {
    if let Err(e) = privilege::ensure_root(opts.euid) {
        reporter.privilege_denied(&opts.program)?;
        return Err(e.into());
    }

    if opts.check_deps {
        preflight::check_all(executor).context("dependency check failed")?;
        info!("all required tools are installed");
    }

    let isolation = ChrootIsolation;
    let ctx = StageContext::new(config, executor, &isolation);
    match Pipeline::standard().run(&ctx, reporter) {
        Ok(()) => {
            reporter.success(&config.identity.name, config.paths.output_iso())?;
            Ok(())
        }
        Err(failure) => {
            reporter.failure(failure.step, &failure.name)?;
            Err(failure.into())
        }
    }
}

/// Entry point behind `main`: handles the informational flags, then builds.
pub fn run<W: Write>(
    cli: &cli::Cli,
    opts: &BuildOptions,
    executor: &dyn CommandExecutor,
    mut out: W,
) -> Result<()> {
    if let Some(shell) = cli.completions {
        cli::write_completions(shell, &mut out);
        return Ok(());
    }

    let config = load_config(cli)?;

    let mut handled = false;
    if cli.print_config {
        writeln!(out, "{}", config)?;
        handled = true;
    }
    if let Some(path) = &cli.save_config {
        config::saved::save(&config, path)?;
        handled = true;
    }
    if handled {
        return Ok(());
    }

    let mut reporter = Reporter::new(out);
    run_build(&config, opts, executor, &mut reporter)
}
