use std::fs;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use luna_builder::config::BuildConfig;
use luna_builder::executor::{CommandExecutor, CommandSpec, ExecutionResult};
use tempfile::TempDir;

/// Executor that records every command and reports success, except for the
/// commands configured to fail.
#[derive(Default)]
#[allow(dead_code)]
pub struct RecordingExecutor {
    pub calls: Mutex<Vec<CommandSpec>>,
    /// Programs that exit with status 1.
    pub failing: Vec<String>,
    /// Programs reported as absent from the search path.
    pub missing: Vec<String>,
}

#[allow(dead_code)]
impl RecordingExecutor {
    pub fn failing_on(command: &str) -> Self {
        Self {
            failing: vec![command.to_string()],
            ..Default::default()
        }
    }

    pub fn missing_tool(tool: &str) -> Self {
        Self {
            missing: vec![tool.to_string()],
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Program names in call order.
    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|spec| spec.command).collect()
    }
}

impl CommandExecutor for RecordingExecutor {
    fn execute(&self, spec: &CommandSpec) -> anyhow::Result<ExecutionResult> {
        self.calls.lock().unwrap().push(spec.clone());
        let code = if self.failing.contains(&spec.command) { 1 } else { 0 };
        Ok(ExecutionResult {
            status: exit_status(code),
        })
    }

    fn command_exists(&self, command: &str) -> bool {
        !self.missing.iter().any(|m| m == command)
    }
}

/// Executor whose spawn attempts all fail.
#[derive(Default)]
#[allow(dead_code)]
pub struct FailingExecutor {
    pub calls: Mutex<Vec<CommandSpec>>,
}

impl CommandExecutor for FailingExecutor {
    fn execute(&self, spec: &CommandSpec) -> anyhow::Result<ExecutionResult> {
        self.calls.lock().unwrap().push(spec.clone());
        anyhow::bail!("simulated spawn failure for {}", spec.command)
    }

    fn command_exists(&self, _command: &str) -> bool {
        true
    }
}

/// Builds an `ExitStatus` carrying `code` as a normal exit.
#[allow(dead_code)]
pub fn exit_status(code: i32) -> ExitStatus {
    ExitStatus::from_raw(code << 8)
}

#[allow(dead_code)]
pub fn utf8_path(temp: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("temp path should be valid UTF-8")
}

/// Default configuration rooted in `temp`, with scripts staged in
/// `<temp>/scripts` instead of `/tmp`.
#[allow(dead_code)]
pub fn test_config(temp: &TempDir) -> BuildConfig {
    let home = utf8_path(temp);
    let script_dir = home.join("scripts");
    fs::create_dir_all(&script_dir).expect("failed to create script dir");

    let mut config = BuildConfig::for_home(&home);
    config.paths = config.paths.clone().with_script_dir(script_dir);
    config
}

/// Places fake kernel and initrd files in the chroot boot directory.
#[allow(dead_code)]
pub fn populate_boot(chroot: &Utf8Path, versions: &[&str]) {
    let boot = chroot.join("boot");
    fs::create_dir_all(&boot).expect("failed to create boot dir");
    for version in versions {
        fs::write(boot.join(format!("vmlinuz-{}", version)), "kernel").unwrap();
        fs::write(boot.join(format!("initrd.img-{}", version)), "initrd").unwrap();
    }
}
