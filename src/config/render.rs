//! `[render]` section configuration.
//!
//! Settings for the external document renderer (pandoc by default).

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[render]` section in docpress.toml - external renderer invocation.
///
/// # Example
/// ```toml
/// [render]
/// command = ["pandoc"]
/// pdf_engine = "xelatex"
/// css = "build_includes/style.css"
/// highlight_style = "tango"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    /// Renderer argv prefix.
    #[serde(default = "defaults::render::command")]
    #[educe(Default = defaults::render::command())]
    pub command: Vec<String>,

    /// PDF engine passed as `--pdf-engine` when set.
    #[serde(default)]
    pub pdf_engine: Option<String>,

    /// Template passed as `--template` when set.
    #[serde(default)]
    pub pdf_template: Option<PathBuf>,

    /// Extra LaTeX header injected with `-H` when set.
    #[serde(default)]
    pub latex_header: Option<PathBuf>,

    /// Stylesheet copied beside rendered HTML and linked via `--css`.
    #[serde(default = "defaults::render::css")]
    #[educe(Default = defaults::render::css())]
    pub css: Option<PathBuf>,

    /// Syntax highlight style passed as `--highlight-style` when set.
    #[serde(default)]
    pub highlight_style: Option<String>,
}
