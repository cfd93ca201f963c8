//! `[validate]` section configuration.
//!
//! Which external validators run, and against which unit subset.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[validate]` section in docpress.toml - external validators.
///
/// Validator failures never fail a build; their output lands in per-unit
/// log files.
///
/// # Example
/// ```toml
/// [validate]
/// spellcheck = true
/// link_check = false
/// only_modified = true
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ValidateConfig {
    /// Run the spellchecker.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = defaults::r#true())]
    pub spellcheck: bool,

    /// Run the markdown link checker.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = defaults::r#true())]
    pub link_check: bool,

    /// Run the markdown style linter.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = defaults::r#true())]
    pub lint: bool,

    /// Validate only the units being rebuilt this run. When false,
    /// validators re-run against every unit on every invocation.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = defaults::r#true())]
    pub only_modified: bool,

    /// Spellchecker argv prefix.
    #[serde(default = "defaults::validate::spellcheck_command")]
    #[educe(Default = defaults::validate::spellcheck_command())]
    pub spellcheck_command: Vec<String>,

    /// Link checker argv prefix.
    #[serde(default = "defaults::validate::link_check_command")]
    #[educe(Default = defaults::validate::link_check_command())]
    pub link_check_command: Vec<String>,

    /// Style linter argv prefix.
    #[serde(default = "defaults::validate::lint_command")]
    #[educe(Default = defaults::validate::lint_command())]
    pub lint_command: Vec<String>,
}

impl ValidateConfig {
    /// Enabled validators as (log file stem, argv prefix) pairs.
    pub fn enabled(&self) -> Vec<(&'static str, &Vec<String>)> {
        [
            ("spellchecker", self.spellcheck, &self.spellcheck_command),
            ("markdown_link_check", self.link_check, &self.link_check_command),
            ("markdown_lint", self.lint, &self.lint_command),
        ]
        .into_iter()
        .filter_map(|(name, on, cmd)| on.then_some((name, cmd)))
        .collect()
    }
}
