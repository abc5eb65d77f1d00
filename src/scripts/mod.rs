//! Chroot setup scripts and the runner that executes them.
//!
//! Each [`ScriptResource`] is a named bash program that configures the target
//! system (bootloader theme, desktop, installer, applications). The text comes
//! from the templates next to this file with `@KEY@` placeholders filled from
//! the [`BuildConfig`]. [`ChrootScriptRunner`] treats the rendered text as
//! opaque: it stages it on the host, copies it into the chroot and runs it there.

use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, warn};

use crate::config::{BuildConfig, BuildPaths};
use crate::error::BuilderError;
use crate::executor::{CommandExecutor, CommandSpec, run_best_effort, run_checked};
use crate::isolation::Isolation;

pub const GRUB_SCRIPT: &str = "setup-grub.sh";
pub const DESKTOP_SCRIPT: &str = "setup-kde.sh";
pub const INSTALLER_SCRIPT: &str = "setup-calamares.sh";
pub const SOFTWARE_SCRIPT: &str = "setup-software.sh";

/// Names of every script staged in the host script directory during a build.
pub const ALL_SCRIPTS: [&str; 4] = [GRUB_SCRIPT, DESKTOP_SCRIPT, INSTALLER_SCRIPT, SOFTWARE_SCRIPT];

const GRUB_TEMPLATE: &str = include_str!("setup-grub.sh");
const DESKTOP_TEMPLATE: &str = include_str!("setup-desktop.sh");
const INSTALLER_TEMPLATE: &str = include_str!("setup-installer.sh");
const SOFTWARE_TEMPLATE: &str = include_str!("setup-software.sh");

/// Interpreter used for scripts inside the chroot.
const CHROOT_SHELL: &str = "/bin/bash";

/// A named shell script to be run inside the chroot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptResource {
    name: &'static str,
    content: String,
}

impl ScriptResource {
    pub fn new(name: &'static str, content: impl Into<String>) -> Self {
        Self {
            name,
            content: content.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Location of the script on the host.
    pub fn host_path(&self, paths: &BuildPaths) -> Utf8PathBuf {
        paths.script_dir().join(self.name)
    }

    /// Location of the script as seen from inside the chroot.
    pub fn chroot_path(&self) -> String {
        format!("/tmp/{}", self.name)
    }
}

/// Substitutes every `@KEY@` placeholder in `template`.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("@{}@", key), value)
    })
}

/// Formats a package list as continuation lines for `apt install -y \`.
fn package_lines(packages: &[String]) -> String {
    packages.join(" \\\n    ")
}

fn render_for(config: &BuildConfig, template: &str, packages: &[String]) -> String {
    let id = &config.identity;
    let live_user = id.short_name.split('-').next().unwrap_or(&id.short_name).to_string();
    let live_user_title = {
        let mut chars = live_user.chars();
        chars
            .next()
            .map(|c| c.to_uppercase().chain(chars).collect::<String>())
            .unwrap_or_default()
    };
    let codename_title = id.display_codename();
    let distrib_id: String = id.name.split_whitespace().collect();
    let packages = package_lines(packages);

    render(
        template,
        &[
            ("DISTRO_NAME", id.name.as_str()),
            ("SHORT_NAME", id.short_name.as_str()),
            ("VERSION", id.version.as_str()),
            ("CODENAME_TITLE", codename_title.as_str()),
            ("CODENAME", id.codename.as_str()),
            ("BASE_NAME", id.base_name.as_str()),
            ("BASE_CODENAME", id.base_codename.as_str()),
            ("LIVE_USER_TITLE", live_user_title.as_str()),
            ("LIVE_USER", live_user.as_str()),
            ("DISTRIB_ID", distrib_id.as_str()),
            ("PACKAGES", packages.as_str()),
        ],
    )
}

/// Bootloader theme and `/etc/default/grub`.
pub fn grub_theme(config: &BuildConfig) -> ScriptResource {
    ScriptResource::new(GRUB_SCRIPT, render_for(config, GRUB_TEMPLATE, &[]))
}

/// Desktop stack, display manager autologin and the default login user.
pub fn desktop(config: &BuildConfig) -> ScriptResource {
    ScriptResource::new(
        DESKTOP_SCRIPT,
        render_for(config, DESKTOP_TEMPLATE, &config.packages.desktop),
    )
}

/// Graphical installer and its branding.
pub fn installer(config: &BuildConfig) -> ScriptResource {
    ScriptResource::new(INSTALLER_SCRIPT, render_for(config, INSTALLER_TEMPLATE, &[]))
}

/// Additional applications and OS identification files.
pub fn software(config: &BuildConfig) -> ScriptResource {
    ScriptResource::new(
        SOFTWARE_SCRIPT,
        render_for(config, SOFTWARE_TEMPLATE, &config.packages.additional),
    )
}

/// Writes `content` to a new file at `path` with mode 0755. Whatever was at
/// `path` before, including a symlink, is unlinked rather than followed.
pub(crate) fn write_script(path: &Utf8Path, content: &str) -> Result<(), BuilderError> {
    match fs::remove_file(path) {
        Ok(()) => debug!("removed stale {}", path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(BuilderError::io(format!("failed to remove stale script: {}", path), e)),
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o755);
    }
    let mut file = options
        .open(path)
        .map_err(|e| BuilderError::io(format!("failed to create script: {}", path), e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| BuilderError::io(format!("failed to write script: {}", path), e))?;

    // umask may have narrowed the creation mode
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o755))
            .map_err(|e| BuilderError::io(format!("failed to set permissions on {}", path), e))?;
    }
    Ok(())
}

/// Runs script resources inside the chroot.
///
/// Four steps per script:
/// 1. write the text to the host script directory (failure aborts)
/// 2. `cp` it into `<chroot>/tmp/` (best-effort)
/// 3. `chmod +x` the copy (best-effort)
/// 4. run `/bin/bash /tmp/<name>` through the isolation backend; its outcome
///    is the result
pub struct ChrootScriptRunner<'a> {
    executor: &'a dyn CommandExecutor,
    isolation: &'a dyn Isolation,
}

impl<'a> ChrootScriptRunner<'a> {
    pub fn new(executor: &'a dyn CommandExecutor, isolation: &'a dyn Isolation) -> Self {
        Self {
            executor,
            isolation,
        }
    }

    pub fn run(&self, script: &ScriptResource, paths: &BuildPaths) -> Result<()> {
        let host_path = script.host_path(paths);
        let chroot_tmp = paths.chroot().join("tmp");

        info!("running {} in {} ({})", script.name(), paths.chroot(), self.isolation.name());

        write_script(&host_path, script.content())?;
        debug!("wrote {} ({} bytes)", host_path, script.content().len());

        let copy_target = format!("{}/", chroot_tmp);
        let copy = CommandSpec::new("cp", [host_path.as_str(), copy_target.as_str()]);
        if !run_best_effort(self.executor, &copy) {
            warn!("could not copy {} into the chroot, continuing", script.name());
        }

        let chmod = CommandSpec::new("chmod", ["+x", chroot_tmp.join(script.name()).as_str()]);
        if !run_best_effort(self.executor, &chmod) {
            warn!("could not mark {} executable, continuing", script.name());
        }

        let spec = self
            .isolation
            .command(paths.chroot(), &[CHROOT_SHELL.to_string(), script.chroot_path()])
            .with_env("DEBIAN_FRONTEND", "noninteractive");
        run_checked(self.executor, &spec)
            .with_context(|| format!("script {} failed inside the chroot", script.name()))?;

        info!("{} completed successfully", script.name());
        Ok(())
    }
}
