//! Saved build configuration files.
//!
//! The file is a single section of `key = value` lines:
//!
//! ```text
//! [Luna Linux Build Configuration]
//! distro_name = Luna Linux
//! version = 1.0
//! ...
//! ```
//!
//! [`save`] writes every key; [`load`] reads the same format back. Keys may
//! be omitted when loading, in which case the default value is kept.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use serde::de::value::{Error as ValueError, MapDeserializer};

use super::{BuildConfig, expand_path};
use crate::error::BuilderError;

/// Header line of a saved configuration file.
pub const SECTION_HEADER: &str = "[Luna Linux Build Configuration]";

/// Values read from a saved configuration file. `None` means "keep the default".
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SavedConfig {
    pub distro_name: Option<String>,
    pub version: Option<String>,
    pub codename: Option<String>,
    pub base_distro: Option<String>,
    pub base_version: Option<String>,
    pub architecture: Option<String>,
    pub work_dir: Option<Utf8PathBuf>,
    pub output_iso: Option<Utf8PathBuf>,
}

/// Raw key set accepted in the file. Absent keys deserialize as empty strings.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Record {
    distro_name: String,
    version: String,
    codename: String,
    base_distro: String,
    base_version: String,
    architecture: String,
    work_dir: String,
    output_iso: String,
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn non_empty_path(value: String) -> Result<Option<Utf8PathBuf>, BuilderError> {
    if value.is_empty() {
        Ok(None)
    } else {
        expand_path(&value).map(Some)
    }
}

/// Renders `config` in the saved-file format.
pub fn render(config: &BuildConfig) -> String {
    let id = &config.identity;
    let entries = [
        ("distro_name", id.name.as_str()),
        ("version", id.version.as_str()),
        ("codename", id.codename.as_str()),
        ("base_distro", id.base_name.as_str()),
        ("base_version", id.base_version.as_str()),
        ("architecture", id.arch.as_str()),
        ("work_dir", config.paths.work().as_str()),
        ("output_iso", config.paths.output_iso().as_str()),
    ];

    let mut out = String::from(SECTION_HEADER);
    out.push('\n');
    for (key, value) in entries {
        out.push_str(&format!("{} = {}\n", key, value));
    }
    out
}

/// Writes `config` to `path`.
pub fn save(config: &BuildConfig, path: &Utf8Path) -> Result<(), BuilderError> {
    fs::write(path, render(config))
        .map_err(|e| BuilderError::io(format!("failed to save configuration: {}", path), e))?;
    tracing::info!("configuration saved to {}", path);
    Ok(())
}

/// Parses the saved-file format.
///
/// The header must be the first non-blank, non-comment line. Blank lines and
/// lines starting with `#` or `;` are ignored. Unknown or duplicate keys are errors.
pub fn parse(content: &str) -> Result<SavedConfig, BuilderError> {
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#') && !line.starts_with(';'));

    match lines.next() {
        Some((_, SECTION_HEADER)) => {}
        Some((lineno, other)) => {
            return Err(BuilderError::Config(format!(
                "line {}: expected section header {}, found '{}'",
                lineno, SECTION_HEADER, other
            )));
        }
        None => {
            return Err(BuilderError::Config(format!(
                "missing section header {}",
                SECTION_HEADER
            )));
        }
    }

    let mut pairs = Vec::new();
    for (lineno, line) in lines {
        let Some((key, value)) = line.split_once('=') else {
            return Err(BuilderError::Config(format!(
                "line {}: expected 'key = value', found '{}'",
                lineno, line
            )));
        };
        pairs.push((key.trim().to_string(), value.trim().to_string()));
    }

    let record = Record::deserialize(MapDeserializer::<_, ValueError>::new(pairs.into_iter()))
        .map_err(|e| BuilderError::Config(e.to_string()))?;

    Ok(SavedConfig {
        distro_name: non_empty(record.distro_name),
        version: non_empty(record.version),
        codename: non_empty(record.codename),
        base_distro: non_empty(record.base_distro),
        base_version: non_empty(record.base_version),
        architecture: non_empty(record.architecture),
        work_dir: non_empty_path(record.work_dir)?,
        output_iso: non_empty_path(record.output_iso)?,
    })
}

/// Reads and parses a saved configuration file.
pub fn load(path: &Utf8Path) -> Result<SavedConfig, BuilderError> {
    tracing::info!("loading configuration from {}", path);
    let content = fs::read_to_string(path)
        .map_err(|e| BuilderError::io(format!("failed to read configuration: {}", path), e))?;
    parse(&content).map_err(|e| match e {
        BuilderError::Config(msg) => BuilderError::Config(format!("{}: {}", path, msg)),
        other => other,
    })
}
