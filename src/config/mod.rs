//! Build configuration for luna-builder.
//!
//! A [`BuildConfig`] is constructed once at startup, adjusted by command-line
//! flags (and optionally a saved configuration file), validated, and then
//! passed by reference to every build stage.

pub mod saved;

use std::fmt;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use regex::Regex;
use url::Url;

use crate::error::BuilderError;

/// Name of the work directory created under the home directory.
pub const WORK_DIR_NAME: &str = "luna-linux-build";

/// Default package mirror passed to the bootstrap tool.
pub const DEFAULT_MIRROR: &str = "http://archive.ubuntu.com/ubuntu/";

/// Identity values are substituted into bash scripts and boot menus verbatim.
const IDENTITY_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9 ._+-]*$";

/// Short name doubles as a user name and a path component.
const SHORT_NAME_PATTERN: &str = r"^[a-z0-9][a-z0-9-]*$";

/// Debian package name syntax.
const PACKAGE_PATTERN: &str = r"^[a-z0-9][a-z0-9+.-]*$";

/// Resolves the invoking user's home directory.
pub fn home_dir() -> Result<Utf8PathBuf, BuilderError> {
    let home = dirs::home_dir()
        .ok_or_else(|| BuilderError::Config("unable to determine home directory".to_string()))?;
    Utf8PathBuf::from_path_buf(home).map_err(|p| {
        BuilderError::Config(format!("home directory is not valid UTF-8: {}", p.display()))
    })
}

/// Replaces a leading `~` with `home`. Any other path is returned unchanged.
pub fn expand_tilde(path: &str, home: &Utf8Path) -> Utf8PathBuf {
    match path.strip_prefix('~') {
        Some(rest) => Utf8PathBuf::from(format!("{}{}", home, rest)),
        None => Utf8PathBuf::from(path),
    }
}

/// Expands a leading `~` using the current user's home directory.
pub fn expand_path(path: &str) -> Result<Utf8PathBuf, BuilderError> {
    if path.starts_with('~') {
        Ok(expand_tilde(path, &home_dir()?))
    } else {
        Ok(Utf8PathBuf::from(path))
    }
}

/// Identity of the distribution being built and the base it derives from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistroIdentity {
    pub name: String,
    pub short_name: String,
    pub version: String,
    pub codename: String,
    pub base_name: String,
    pub base_version: String,
    pub base_codename: String,
    pub arch: String,
    pub mirror: String,
}

impl Default for DistroIdentity {
    fn default() -> Self {
        Self {
            name: "Luna Linux".to_string(),
            short_name: "luna-linux".to_string(),
            version: "1.0".to_string(),
            codename: "stellar".to_string(),
            base_name: "ubuntu".to_string(),
            base_version: "22.04".to_string(),
            base_codename: "jammy".to_string(),
            arch: "amd64".to_string(),
            mirror: DEFAULT_MIRROR.to_string(),
        }
    }
}

impl DistroIdentity {
    /// Codename with its first letter upper-cased, e.g. "Stellar".
    pub fn display_codename(&self) -> String {
        capitalize(&self.codename)
    }

    /// Base distribution name with its first letter upper-cased, e.g. "Ubuntu".
    pub fn display_base_name(&self) -> String {
        capitalize(&self.base_name)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Directory layout of a build.
///
/// The chroot, image and iso directories are always derived from the work
/// directory and can't be set independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPaths {
    work: Utf8PathBuf,
    chroot: Utf8PathBuf,
    image: Utf8PathBuf,
    iso: Utf8PathBuf,
    output_iso: Utf8PathBuf,
    script_dir: Utf8PathBuf,
}

impl BuildPaths {
    /// Creates the layout rooted at `work`, writing the final image to `output_iso`.
    /// Generated scripts are staged in `/tmp` on the host.
    pub fn new(work: impl Into<Utf8PathBuf>, output_iso: impl Into<Utf8PathBuf>) -> Self {
        let work = work.into();
        Self {
            chroot: work.join("chroot"),
            image: work.join("image"),
            iso: work.join("iso"),
            work,
            output_iso: output_iso.into(),
            script_dir: Utf8PathBuf::from("/tmp"),
        }
    }

    /// Overrides the host directory generated scripts are written to.
    #[must_use]
    pub fn with_script_dir(mut self, script_dir: impl Into<Utf8PathBuf>) -> Self {
        self.script_dir = script_dir.into();
        self
    }

    /// Moves the layout to a new work directory, re-deriving the sub-directories.
    pub fn set_work(&mut self, work: impl Into<Utf8PathBuf>) {
        let work = work.into();
        self.chroot = work.join("chroot");
        self.image = work.join("image");
        self.iso = work.join("iso");
        self.work = work;
    }

    pub fn set_output_iso(&mut self, output_iso: impl Into<Utf8PathBuf>) {
        self.output_iso = output_iso.into();
    }

    pub fn work(&self) -> &Utf8Path {
        &self.work
    }

    pub fn chroot(&self) -> &Utf8Path {
        &self.chroot
    }

    pub fn image(&self) -> &Utf8Path {
        &self.image
    }

    pub fn iso(&self) -> &Utf8Path {
        &self.iso
    }

    pub fn output_iso(&self) -> &Utf8Path {
        &self.output_iso
    }

    pub fn script_dir(&self) -> &Utf8Path {
        &self.script_dir
    }
}

/// Package lists installed into the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLists {
    /// Packages passed to the bootstrap tool's include list.
    pub base: Vec<String>,
    /// Desktop environment packages.
    pub desktop: Vec<String>,
    /// Applications installed after the desktop and installer.
    pub additional: Vec<String>,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for PackageLists {
    fn default() -> Self {
        Self {
            base: owned(&[
                "systemd",
                "systemd-sysv",
                "dbus",
                "locales",
                "kbd",
                "console-setup",
                "network-manager",
                "sudo",
                "linux-image-generic",
                "initramfs-tools",
                "casper",
            ]),
            desktop: owned(&[
                "kde-plasma-desktop",
                "plasma-workspace-wayland",
                "kwin-wayland",
                "sddm",
                "sddm-theme-breeze",
                "plasma-nm",
                "plasma-pa",
                "dolphin",
                "konsole",
                "kate",
                "ark",
            ]),
            additional: owned(&[
                "firefox",
                "libreoffice",
                "vlc",
                "gimp",
                "neofetch",
                "curl",
                "wget",
                "git",
                "nano",
            ]),
        }
    }
}

/// Complete configuration of a single build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub identity: DistroIdentity,
    pub paths: BuildPaths,
    pub packages: PackageLists,
    /// Home directory of the invoking user. Never removed by a clean build.
    pub home: Utf8PathBuf,
    /// Echo every invoked command.
    pub verbose: bool,
    /// Remove the work directory before creating it.
    pub clean_build: bool,
}

impl BuildConfig {
    /// Creates the default configuration for the current user's home directory.
    pub fn new() -> Result<Self, BuilderError> {
        Ok(Self::for_home(&home_dir()?))
    }

    /// Creates the default configuration rooted at `home`.
    pub fn for_home(home: &Utf8Path) -> Self {
        let identity = DistroIdentity::default();
        let output_iso = home.join(format!(
            "Luna-Linux-{}-{}.iso",
            identity.base_version, identity.arch
        ));
        Self {
            paths: BuildPaths::new(home.join(WORK_DIR_NAME), output_iso),
            identity,
            packages: PackageLists::default(),
            home: home.to_path_buf(),
            verbose: false,
            clean_build: false,
        }
    }

    /// Overlays values read from a saved configuration file.
    pub fn apply_saved(&mut self, saved: saved::SavedConfig) {
        let id = &mut self.identity;
        if let Some(v) = saved.distro_name {
            id.name = v;
        }
        if let Some(v) = saved.version {
            id.version = v;
        }
        if let Some(v) = saved.codename {
            id.codename = v;
        }
        if let Some(v) = saved.base_distro {
            id.base_name = v;
        }
        if let Some(v) = saved.base_version {
            id.base_version = v;
        }
        if let Some(v) = saved.architecture {
            id.arch = v;
        }
        if let Some(v) = saved.work_dir {
            self.paths.set_work(v);
        }
        if let Some(v) = saved.output_iso {
            self.paths.set_output_iso(v);
        }
    }

    /// Checks the configuration before any stage runs.
    pub fn validate(&self) -> Result<(), BuilderError> {
        let id = &self.identity;
        for (label, value) in [
            ("distro name", &id.name),
            ("version", &id.version),
            ("codename", &id.codename),
            ("base codename", &id.base_codename),
            ("architecture", &id.arch),
        ] {
            if value.trim().is_empty() {
                return Err(BuilderError::Config(format!("{} must not be empty", label)));
            }
        }

        let identity = compile(IDENTITY_PATTERN)?;
        for (label, value) in [
            ("distro name", &id.name),
            ("version", &id.version),
            ("codename", &id.codename),
            ("base distribution", &id.base_name),
            ("base version", &id.base_version),
            ("base codename", &id.base_codename),
            ("architecture", &id.arch),
        ] {
            if !identity.is_match(value) {
                return Err(BuilderError::Config(format!(
                    "{} contains unsupported characters: {:?}",
                    label, value
                )));
            }
        }
        if !compile(SHORT_NAME_PATTERN)?.is_match(&id.short_name) {
            return Err(BuilderError::Config(format!(
                "short name contains unsupported characters: {:?}",
                id.short_name
            )));
        }

        let mirror = Url::parse(&id.mirror)
            .map_err(|e| BuilderError::Config(format!("invalid mirror URL '{}': {}", id.mirror, e)))?;
        if !matches!(mirror.scheme(), "http" | "https") {
            return Err(BuilderError::Config(format!(
                "mirror URL must use http or https: {}",
                id.mirror
            )));
        }

        self.validate_work_dir()?;
        if self.paths.output_iso().file_name().is_none() {
            return Err(BuilderError::Config(format!(
                "output ISO path has no file name: {}",
                self.paths.output_iso()
            )));
        }

        if self.packages.base.is_empty() {
            return Err(BuilderError::Config("base package list must not be empty".to_string()));
        }
        let package = compile(PACKAGE_PATTERN)?;
        let lists = [&self.packages.base, &self.packages.desktop, &self.packages.additional];
        if let Some(name) = lists.into_iter().flatten().find(|name| !package.is_match(name)) {
            return Err(BuilderError::Config(format!("invalid package name: {:?}", name)));
        }

        Ok(())
    }

    /// The work directory is wiped by a clean build, so it must be an
    /// absolute path below `/` that does not contain the home directory.
    fn validate_work_dir(&self) -> Result<(), BuilderError> {
        let work = self.paths.work();
        if !work.is_absolute() {
            return Err(BuilderError::Config(format!(
                "work directory must be absolute: {}",
                work
            )));
        }
        if work.components().any(|c| c == Utf8Component::ParentDir) {
            return Err(BuilderError::Config(format!(
                "work directory must not contain '..': {}",
                work
            )));
        }
        if work.parent().is_none() {
            return Err(BuilderError::Config(format!(
                "work directory must not be the root directory: {}",
                work
            )));
        }
        if self.home.starts_with(work) {
            return Err(BuilderError::Config(format!(
                "work directory must not contain the home directory {}: {}",
                self.home, work
            )));
        }
        Ok(())
    }
}

fn compile(pattern: &str) -> Result<Regex, BuilderError> {
    Regex::new(pattern)
        .map_err(|e| BuilderError::Config(format!("invalid pattern {}: {}", pattern, e)))
}

impl fmt::Display for BuildConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = &self.identity;
        writeln!(f, "=== Luna Linux Builder configuration ===")?;
        writeln!(f, "Distribution: {} {} ({})", id.name, id.version, id.codename)?;
        writeln!(f, "Base:         {} {} {}", id.base_name, id.base_version, id.arch)?;
        writeln!(f, "Work dir:     {}", self.paths.work())?;
        writeln!(f, "Output ISO:   {}", self.paths.output_iso())?;
        writeln!(f, "Mode:         {}", if self.verbose { "verbose" } else { "normal" })?;
        write!(f, "========================================")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_tilde_replaces_leading_tilde() {
        let home = Utf8Path::new("/home/luna");
        assert_eq!(expand_tilde("~/builds/out.iso", home), "/home/luna/builds/out.iso");
        assert_eq!(expand_tilde("~", home), "/home/luna");
    }

    #[test]
    fn expand_tilde_leaves_other_paths_alone() {
        let home = Utf8Path::new("/home/luna");
        assert_eq!(expand_tilde("/srv/~/x", home), "/srv/~/x");
        assert_eq!(expand_tilde("relative/path", home), "relative/path");
        assert_eq!(expand_tilde("", home), "");
    }

    #[test]
    fn expand_path_passes_through_absolute() {
        assert_eq!(expand_path("/var/tmp").unwrap(), "/var/tmp");
    }

    #[test]
    fn paths_are_derived_from_work_dir() {
        let mut paths = BuildPaths::new("/w", "/out.iso");
        assert_eq!(paths.chroot(), "/w/chroot");
        assert_eq!(paths.image(), "/w/image");
        assert_eq!(paths.iso(), "/w/iso");
        assert_eq!(paths.script_dir(), "/tmp");

        paths.set_work("/other");
        assert!(paths.chroot().starts_with(paths.work()));
        assert_eq!(paths.iso(), "/other/iso");
    }

    #[test]
    fn default_config_for_home() {
        let config = BuildConfig::for_home(Utf8Path::new("/home/luna"));
        assert_eq!(config.paths.work(), "/home/luna/luna-linux-build");
        assert_eq!(config.paths.output_iso(), "/home/luna/Luna-Linux-22.04-amd64.iso");
        assert!(!config.verbose);
        assert!(!config.clean_build);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_mirror() {
        let mut config = BuildConfig::for_home(Utf8Path::new("/home/luna"));
        config.identity.mirror = "ftp://mirror.example.org/ubuntu".to_string();
        assert!(matches!(config.validate(), Err(BuilderError::Config(_))));

        config.identity.mirror = "not a url".to_string();
        assert!(matches!(config.validate(), Err(BuilderError::Config(_))));
    }

    #[test]
    fn validate_rejects_relative_work_dir() {
        let mut config = BuildConfig::for_home(Utf8Path::new("/home/luna"));
        config.paths.set_work("relative");
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_root_work_dir() {
        let mut config = BuildConfig::for_home(Utf8Path::new("/home/luna"));
        config.clean_build = true;
        config.apply_saved(
            saved::parse("[Luna Linux Build Configuration]\nwork_dir = /\n").unwrap(),
        );
        assert_eq!(config.paths.work(), "/");
        assert!(matches!(config.validate(), Err(BuilderError::Config(_))));

        for work in ["/home/luna", "/home/luna/", "/home", "/home/luna/build/../..", "/."] {
            config.paths.set_work(work);
            assert!(config.validate().is_err(), "{} accepted", work);
        }

        config.paths.set_work("/home/luna/builds/luna");
        assert!(config.validate().is_ok());
        config.paths.set_work("/srv/luna-build");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_shell_metacharacters() {
        let base = BuildConfig::for_home(Utf8Path::new("/home/luna"));

        let mut config = base.clone();
        config.identity.name = "Luna \"$(reboot)\"".to_string();
        assert!(matches!(config.validate(), Err(BuilderError::Config(_))));

        let mut config = base.clone();
        config.identity.version = "1.0; rm -rf /".to_string();
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.identity.codename = "stellar`id`".to_string();
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.identity.short_name = "luna linux".to_string();
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.packages.additional.push("vim && reboot".to_string());
        assert!(config.validate().is_err());

        let mut config = base;
        config.identity.name = "Luna Linux+ 2.0_beta".to_string();
        config.identity.version = "2.0-rc1".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn display_names_are_capitalized() {
        let id = DistroIdentity::default();
        assert_eq!(id.display_codename(), "Stellar");
        assert_eq!(id.display_base_name(), "Ubuntu");
    }
}
