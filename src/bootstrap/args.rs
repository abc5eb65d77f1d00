//! Shared command argument builder used by the external-tool stages.

use std::fmt::Display;

/// Defines how a flag and its value are rendered in command arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagValueStyle {
    /// Render flag and value as separate arguments: `--flag value`.
    Separate,
    /// Render flag and value as a single argument with equals: `--flag=value`.
    Equals,
}

/// Builder for assembling command arguments consistently.
#[derive(Debug, Default)]
pub struct CommandArgsBuilder {
    args: Vec<String>,
}

impl CommandArgsBuilder {
    /// Create a new, empty builder.
    pub fn new() -> Self {
        Self { args: Vec::new() }
    }

    /// Append a raw argument to the builder.
    pub fn push_arg(&mut self, arg: impl Display) {
        self.args.push(arg.to_string());
    }

    /// Append a flag with no value.
    pub fn push_flag(&mut self, flag: &str) {
        self.args.push(flag.to_string());
    }

    /// Append a flag with value if the value is not empty.
    pub fn push_flag_value(&mut self, flag: &str, value: &str, style: FlagValueStyle) {
        if value.is_empty() {
            return;
        }

        match style {
            FlagValueStyle::Separate => {
                self.args.push(flag.to_string());
                self.args.push(value.to_string());
            }
            FlagValueStyle::Equals => {
                self.args.push(format!("{}={}", flag, value));
            }
        }
    }

    /// Append a flag whose value is the comma-joined list of non-empty `values`.
    ///
    /// Nothing is added when every value is empty.
    pub fn push_flag_list(&mut self, flag: &str, values: &[String], style: FlagValueStyle) {
        let joined = values
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        self.push_flag_value(flag, &joined, style);
    }

    /// Return the collected arguments.
    pub fn into_args(self) -> Vec<String> {
        self.args
    }
}
