//! Project configuration management for `docpress.toml`.
//!
//! # Sections
//!
//! | Section      | Purpose                                        |
//! |--------------|------------------------------------------------|
//! | `[paths]`    | Project directory layout and unit ordering     |
//! | `[render]`   | External renderer invocation (pandoc)          |
//! | `[publish]`  | External destination folders per artifact kind |
//! | `[remote]`   | Remote object storage for data archives        |
//! | `[validate]` | External validators and their scope            |
//!
//! # Example
//!
//! ```toml
//! [paths]
//! source = "source"
//! document_order = ["intro", "setup"]
//!
//! [render]
//! pdf_engine = "xelatex"
//! css = "build_includes/style.css"
//!
//! [publish]
//! pdf = "~/shared/pdf"
//!
//! [remote]
//! project_id = "1234"
//! project_name = "docs"
//! ```

mod defaults;
mod error;
mod paths;
mod publish;
mod remote;
mod render;
mod validate;

pub use error::ConfigError;
pub use paths::PathsConfig;
pub use publish::PublishConfig;
pub use remote::RemoteConfig;
pub use render::RenderConfig;
pub use validate::ValidateConfig;

use crate::cli::{Cli, Commands};
use anyhow::{Context, Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing docpress.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// CLI arguments reference
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory (set after loading)
    #[serde(skip)]
    root: PathBuf,

    /// Directory layout
    #[serde(default)]
    pub paths: PathsConfig,

    /// Renderer settings
    #[serde(default)]
    pub render: RenderConfig,

    /// Publish destinations
    #[serde(default)]
    pub publish: PublishConfig,

    /// Remote storage settings
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Validator settings
    #[serde(default)]
    pub validate: ValidateConfig,
}

impl ProjectConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: ProjectConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Get the project root directory
    pub fn get_root(&self) -> &Path {
        if self.root.as_os_str().is_empty() {
            Path::new("./")
        } else {
            &self.root
        }
    }

    /// Set the project root directory
    pub fn set_root(&mut self, path: &Path) {
        self.root = path.to_path_buf();
    }

    /// Get CLI arguments reference
    pub fn get_cli(&self) -> &'static Cli {
        self.cli.unwrap()
    }

    /// Source folder for one unit.
    pub fn unit_source(&self, unit: &str) -> PathBuf {
        self.paths.source.join(unit)
    }

    /// Manifest file for one unit, under the build-logs tree.
    pub fn unit_manifest(&self, unit: &str) -> PathBuf {
        self.paths.logs.join(unit).join("manifest.txt")
    }

    /// Link record file for one unit.
    pub fn unit_link_record(&self, unit: &str) -> PathBuf {
        self.paths.links.join(format!("{unit}.txt"))
    }

    /// Packaged archive path for one unit.
    pub fn unit_archive(&self, unit: &str) -> PathBuf {
        self.paths.data.join(format!("{unit}.tar.gz"))
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &'static Cli) {
        self.cli = Some(cli);

        // `new <path>` treats the given path as the root to create
        let root = match &cli.command {
            Commands::New { path } => {
                let base = cli
                    .root
                    .as_ref()
                    .cloned()
                    .unwrap_or_else(|| self.get_root().to_owned());
                base.join(path)
            }
            _ => cli
                .root
                .as_ref()
                .cloned()
                .unwrap_or_else(|| self.get_root().to_owned()),
        };

        self.set_root(&root);
        self.update_paths_with_root();
    }

    /// Make every configured path absolute.
    ///
    /// Project paths resolve against the root; publish destinations get
    /// tilde expansion first since they usually point outside the project.
    fn update_paths_with_root(&mut self) {
        let root = Self::normalize_path(self.get_root());
        self.set_root(&root);
        self.config_path = root.join(&self.get_cli().config);

        for path in [
            &mut self.paths.source,
            &mut self.paths.markdown,
            &mut self.paths.html,
            &mut self.paths.pdf,
            &mut self.paths.data,
            &mut self.paths.links,
            &mut self.paths.logs,
            &mut self.paths.build_includes,
        ] {
            *path = Self::normalize_path(&root.join(path.as_path()));
        }

        for path in [
            &mut self.paths.license_notice,
            &mut self.render.pdf_template,
            &mut self.render.latex_header,
            &mut self.render.css,
        ]
        .into_iter()
        .flatten()
        {
            *path = Self::normalize_path(&root.join(path.as_path()));
        }

        for dest in [
            &mut self.publish.markdown,
            &mut self.publish.html,
            &mut self.publish.pdf,
            &mut self.publish.data,
        ]
        .into_iter()
        .flatten()
        {
            *dest = Self::expand_destination(dest, &root);
        }
    }

    /// Expand `~` and make a publish destination absolute.
    fn expand_destination(path: &Path, root: &Path) -> PathBuf {
        let expanded = path
            .to_str()
            .map(|s| shellexpand::tilde(s).into_owned())
            .map(PathBuf::from)
            .unwrap_or_else(|| path.to_path_buf());
        if expanded.is_relative() {
            Self::normalize_path(&root.join(expanded))
        } else {
            Self::normalize_path(&expanded)
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration for the current command.
    ///
    /// Environment problems (missing executables, missing configured
    /// files or project folders) are fatal before any unit is touched.
    pub fn validate(&self) -> Result<()> {
        let cli = self.get_cli();

        match &cli.command {
            Commands::New { .. } => {
                if self.get_root().exists() {
                    bail!("Path already exists");
                }
            }
            Commands::Import { files } => {
                self.check_project_folders()?;
                if files.is_empty() {
                    bail!("No files given to import");
                }
            }
            Commands::Build { .. } | Commands::Upload { .. } => {
                self.check_project_folders()?;
                self.check_tools()?;
                self.check_render_files()?;

                if cli.is_upload()
                    && (self.remote.project_id.is_empty() || self.remote.project_name.is_empty())
                {
                    bail!(ConfigError::Validation(
                        "[remote.project_id] and [remote.project_name] are required for upload"
                            .into()
                    ));
                }
            }
        }

        Ok(())
    }

    /// All project-owned folders must exist before a build.
    fn check_project_folders(&self) -> Result<()> {
        for (field, path) in [
            ("[paths.source]", &self.paths.source),
            ("[paths.markdown]", &self.paths.markdown),
            ("[paths.html]", &self.paths.html),
            ("[paths.pdf]", &self.paths.pdf),
            ("[paths.data]", &self.paths.data),
            ("[paths.links]", &self.paths.links),
            ("[paths.logs]", &self.paths.logs),
        ] {
            if !path.exists() {
                bail!(ConfigError::MissingFolder {
                    field,
                    path: path.clone(),
                });
            }
        }
        Ok(())
    }

    /// Renderer and enabled validators must be installed.
    fn check_tools(&self) -> Result<()> {
        Self::check_command_installed("[render.command]", &self.render.command)?;
        for (name, command) in self.validate.enabled() {
            Self::check_command_installed(&format!("[validate] {name}"), command)?;
        }
        Ok(())
    }

    /// Configured render support files must exist.
    fn check_render_files(&self) -> Result<()> {
        for (field, path) in [
            ("[render.pdf_template]", &self.render.pdf_template),
            ("[render.latex_header]", &self.render.latex_header),
            ("[render.css]", &self.render.css),
            ("[paths.license_notice]", &self.paths.license_notice),
        ] {
            if let Some(path) = path {
                if !path.is_file() {
                    bail!(ConfigError::MissingFile {
                        field,
                        path: path.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Check if a command is installed and available
    fn check_command_installed(field: &str, command: &[String]) -> Result<()> {
        if command.is_empty() {
            bail!(ConfigError::Validation(format!(
                "{field} must have at least one element"
            )));
        }

        let cmd = &command[0];
        which::which(cmd)
            .with_context(|| format!("`{cmd}` not found. Please install it first."))?;

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
