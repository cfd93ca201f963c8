//! `[paths]` section configuration.
//!
//! Every staging directory the pipeline owns, plus the unit ordering used
//! by published indexes. All paths are made absolute against the project
//! root after loading.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[paths]` section in docpress.toml - project directory layout.
///
/// # Example
/// ```toml
/// [paths]
/// source = "source"
/// markdown = "markdown"
/// pdf = "pdf"
/// document_order = ["intro", "setup"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Unit source folders live here, one subdirectory per unit.
    #[serde(default = "defaults::paths::source")]
    #[educe(Default = defaults::paths::source())]
    pub source: PathBuf,

    /// Staged markdown output (post asset rewriting).
    #[serde(default = "defaults::paths::markdown")]
    #[educe(Default = defaults::paths::markdown())]
    pub markdown: PathBuf,

    /// Rendered HTML output.
    #[serde(default = "defaults::paths::html")]
    #[educe(Default = defaults::paths::html())]
    pub html: PathBuf,

    /// Rendered PDF output.
    #[serde(default = "defaults::paths::pdf")]
    #[educe(Default = defaults::paths::pdf())]
    pub pdf: PathBuf,

    /// Packaged data archives (`<unit>.tar.gz`).
    #[serde(default = "defaults::paths::data")]
    #[educe(Default = defaults::paths::data())]
    pub data: PathBuf,

    /// Shareable-link records, one `<unit>.txt` per unit.
    #[serde(default = "defaults::paths::links")]
    #[educe(Default = defaults::paths::links())]
    pub links: PathBuf,

    /// Build logs and per-unit manifests.
    #[serde(default = "defaults::paths::logs")]
    #[educe(Default = defaults::paths::logs())]
    pub logs: PathBuf,

    /// Render support files (templates, css) copied in at scaffold time.
    #[serde(default = "defaults::paths::build_includes")]
    #[educe(Default = defaults::paths::build_includes())]
    pub build_includes: PathBuf,

    /// Explicit ordering for published indexes. Units not listed here
    /// sort after listed ones, case-insensitively.
    #[serde(default)]
    pub document_order: Vec<String>,

    /// License notice injected into archives that lack one.
    #[serde(default)]
    pub license_notice: Option<PathBuf>,
}
