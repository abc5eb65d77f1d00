//! Base system bootstrap.
//!
//! Builds the mmdebstrap invocation that creates the minimal target root
//! filesystem in the chroot directory.

mod args;

use crate::config::BuildConfig;
use crate::executor::CommandSpec;

pub use args::{CommandArgsBuilder, FlagValueStyle};

/// Executable name of the bootstrap tool.
pub const BOOTSTRAP_TOOL: &str = "mmdebstrap";

/// Package selection passed as `--variant`: the `required` set plus all
/// packages with `Priority:important`.
pub const VARIANT: &str = "important";

/// Bootstrap invocation for a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bootstrap<'a> {
    config: &'a BuildConfig,
}

impl<'a> Bootstrap<'a> {
    pub fn new(config: &'a BuildConfig) -> Self {
        Self { config }
    }

    /// Builds the command-line arguments:
    /// `--variant=important --include=<base packages> <suite> <chroot> <mirror>`.
    #[tracing::instrument(skip(self))]
    pub fn build_args(&self) -> Vec<String> {
        let mut builder = CommandArgsBuilder::new();
        builder.push_flag_value("--variant", VARIANT, FlagValueStyle::Equals);
        builder.push_flag_list("--include", &self.config.packages.base, FlagValueStyle::Equals);
        builder.push_arg(&self.config.identity.base_codename);
        builder.push_arg(self.config.paths.chroot());
        builder.push_arg(&self.config.identity.mirror);

        let args = builder.into_args();
        tracing::debug!("{} args: {:?}", BOOTSTRAP_TOOL, args);
        args
    }

    pub fn command(&self) -> CommandSpec {
        CommandSpec::new(BOOTSTRAP_TOOL, self.build_args())
    }
}
