use anyhow::Result;
use clap::Parser;
use clap::error::ErrorKind;
use luna_builder::cli::{Cli, LogLevel, parse_error_exit_code};

#[test]
fn test_parse_defaults() -> Result<()> {
    let args = Cli::try_parse_from(["luna-builder"])?;
    assert!(!args.verbose);
    assert!(!args.clean);
    assert!(!args.print_config);
    assert!(!args.check_deps);
    assert!(args.config.is_none());
    assert!(args.save_config.is_none());
    assert!(args.completions.is_none());
    assert_eq!(args.log_level, LogLevel::Info);
    Ok(())
}

#[test]
fn test_parse_short_flags() -> Result<()> {
    let args = Cli::try_parse_from(["luna-builder", "-v", "-c"])?;
    assert!(args.verbose);
    assert!(args.clean);

    let args = Cli::try_parse_from(["luna-builder", "-vc"])?;
    assert!(args.verbose && args.clean);
    Ok(())
}

#[test]
fn test_parse_config_options() -> Result<()> {
    let args = Cli::try_parse_from([
        "luna-builder",
        "--config",
        "/etc/luna.conf",
        "--save-config",
        "out.conf",
        "--print-config",
        "--check-deps",
        "--log-level",
        "debug",
    ])?;
    assert_eq!(args.config.as_deref().map(|p| p.as_str()), Some("/etc/luna.conf"));
    assert_eq!(args.save_config.as_deref().map(|p| p.as_str()), Some("out.conf"));
    assert!(args.print_config);
    assert!(args.check_deps);
    assert_eq!(args.log_level, LogLevel::Debug);
    Ok(())
}

#[test]
fn test_unknown_flag_exits_with_one() {
    let err = Cli::try_parse_from(["luna-builder", "--bogus"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    assert_eq!(parse_error_exit_code(&err), 1);
}

#[test]
fn test_help_exits_with_zero() {
    let err = Cli::try_parse_from(["luna-builder", "-h"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    assert_eq!(parse_error_exit_code(&err), 0);
}
