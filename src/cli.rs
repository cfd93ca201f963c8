//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docpress document pipeline CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name (default: docpress.toml)
    #[arg(short = 'C', long, default_value = "docpress.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Shared build arguments for Build and Upload commands
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Reprocess every unit even when the manifest says it is unchanged
    #[arg(short, long)]
    pub force: bool,

    /// Split documents into instructor/student/feedback variants and
    /// validate their structure before rendering
    #[arg(short, long)]
    pub assignment: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Scaffold a new empty project in the given folder
    New {
        /// the path of the project directory to create
        path: PathBuf,
    },

    /// Import externally-authored markdown files as new units
    Import {
        /// markdown files to import, one new unit per file
        files: Vec<PathBuf>,
    },

    /// Build modified units, render them, and publish locally
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Build, publish, then upload data archives to remote storage
    Upload {
        #[command(flatten)]
        build_args: BuildArgs,
    },
}

#[allow(unused)]
impl Cli {
    pub const fn is_new(&self) -> bool {
        matches!(self.command, Commands::New { .. })
    }
    pub const fn is_import(&self) -> bool {
        matches!(self.command, Commands::Import { .. })
    }
    pub const fn is_build(&self) -> bool {
        matches!(self.command, Commands::Build { .. })
    }
    pub const fn is_upload(&self) -> bool {
        matches!(self.command, Commands::Upload { .. })
    }

    /// Build arguments for Build and Upload, if present.
    pub fn build_args(&self) -> Option<&BuildArgs> {
        match &self.command {
            Commands::Build { build_args } | Commands::Upload { build_args } => Some(build_args),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_force() {
        let cli = Cli::parse_from(["docpress", "build", "--force"]);
        assert!(cli.is_build());
        assert!(cli.build_args().unwrap().force);
        assert!(!cli.build_args().unwrap().assignment);
    }

    #[test]
    fn test_parse_upload_assignment() {
        let cli = Cli::parse_from(["docpress", "upload", "-a"]);
        assert!(cli.is_upload());
        assert!(cli.build_args().unwrap().assignment);
    }

    #[test]
    fn test_parse_new() {
        let cli = Cli::parse_from(["docpress", "new", "myproject"]);
        assert!(cli.is_new());
        assert!(cli.build_args().is_none());
    }

    #[test]
    fn test_parse_import_files() {
        let cli = Cli::parse_from(["docpress", "import", "a.md", "b.md"]);
        match cli.command {
            Commands::Import { files } => assert_eq!(files.len(), 2),
            _ => panic!("expected import"),
        }
    }

    #[test]
    fn test_default_config_name() {
        let cli = Cli::parse_from(["docpress", "build"]);
        assert_eq!(cli.config, PathBuf::from("docpress.toml"));
    }
}
