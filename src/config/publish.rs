//! `[publish]` section configuration.
//!
//! External destination folders, one per artifact kind. Unset or empty
//! paths mean that destination is disabled, not an error.

use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[publish]` section in docpress.toml - external destinations.
///
/// # Example
/// ```toml
/// [publish]
/// markdown = "~/shared/docs"
/// html = "~/shared/docs"
/// pdf = "~/shared/pdf"
/// data = "~/shared/data"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct PublishConfig {
    /// Destination for staged markdown (a `markdown/` subtree is created).
    #[serde(default)]
    pub markdown: Option<PathBuf>,

    /// Destination for rendered HTML (an `html/` subtree is created).
    #[serde(default)]
    pub html: Option<PathBuf>,

    /// Destination for rendered PDFs, flattened to `<unit>.pdf`.
    #[serde(default)]
    pub pdf: Option<PathBuf>,

    /// Destination for data archives.
    #[serde(default)]
    pub data: Option<PathBuf>,
}

impl PublishConfig {
    /// Destinations that are configured, as (kind, path) pairs.
    pub fn configured(&self) -> Vec<(&'static str, &PathBuf)> {
        [
            ("markdown", self.markdown.as_ref()),
            ("html", self.html.as_ref()),
            ("pdf", self.pdf.as_ref()),
            ("data", self.data.as_ref()),
        ]
        .into_iter()
        .filter_map(|(kind, path)| path.map(|p| (kind, p)))
        .collect()
    }
}
