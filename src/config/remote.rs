//! `[remote]` section configuration.
//!
//! Remote object-storage settings for archive distribution.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[remote]` section in docpress.toml - remote storage for data archives.
///
/// The credential itself never lives in the config file; only the name of
/// the environment variable holding it does.
///
/// # Example
/// ```toml
/// [remote]
/// project_id = "1234"
/// project_name = "docs"
/// credential_env = "DOCPRESS_REMOTE_TOKEN"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    /// Remote project identifier, first segment of every remote path.
    #[serde(default)]
    pub project_id: String,

    /// Remote project name, second segment of every remote path.
    #[serde(default)]
    pub project_name: String,

    /// Environment variable supplying the access credential.
    #[serde(default = "defaults::remote::credential_env")]
    #[educe(Default = defaults::remote::credential_env())]
    pub credential_env: String,

    /// RPC endpoint base (metadata, shared links).
    #[serde(default = "defaults::remote::api_base")]
    #[educe(Default = defaults::remote::api_base())]
    pub api_base: String,

    /// Content endpoint base (uploads).
    #[serde(default = "defaults::remote::content_base")]
    #[educe(Default = defaults::remote::content_base())]
    pub content_base: String,
}

impl RemoteConfig {
    /// Remote folder all archives for this project live under.
    pub fn remote_folder(&self) -> String {
        format!("/{}/{}", self.project_id, self.project_name)
    }
}
