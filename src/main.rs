//! Docpress - an incremental markdown document build and publish tool.

mod archive;
mod assets;
mod assignment;
mod build;
mod cli;
mod config;
mod init;
mod links;
mod manifest;
mod publish;
mod remote;
mod render;
mod utils;
mod validate;

use anyhow::{Result, bail};
use clap::Parser;
use cli::{Cli, Commands};
use config::ProjectConfig;
use std::path::Path;

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    let config: &'static ProjectConfig = Box::leak(Box::new(load_config(cli)?));

    match &cli.command {
        Commands::New { .. } => init::new_project(config),
        Commands::Import { files } => init::import_files(config, files),
        Commands::Build { .. } => build::build(config),
        Commands::Upload { build_args } => {
            // archives for healthy units still upload when a unit fails
            let built = build::build(config);
            remote::upload_archives(config, build_args.force)?;
            built
        }
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &'static Cli) -> Result<ProjectConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    let mut config = if config_path.exists() {
        ProjectConfig::from_path(&config_path)?
    } else {
        ProjectConfig::default()
    };
    config.update_with_cli(cli);

    // `new` scaffolds its own config; everything else needs one on disk
    let config_exists = config_path.exists();
    match (cli.is_new(), config_exists) {
        (true, true) => {
            bail!("Config file already exists. Remove it manually or create in a different path.")
        }
        (false, false) => bail!("Config file not found."),
        _ => {}
    }

    config.validate()?;

    Ok(config)
}
