//! Project initialization module.
//!
//! Creates new project structure with default configuration, and
//! imports existing markdown files as fresh units.

use crate::{config::ProjectConfig, log};
use anyhow::{Context, Result, bail};
use std::{fs, path::{Path, PathBuf}};

/// Default config filename
const CONFIG_FILE: &str = "docpress.toml";

/// Subdirectories every unit starts with
const UNIT_DIRS: &[&str] = &["data", "data_not_tracked", "includes"];

/// Units seeded into a fresh project
const SAMPLE_UNITS: &[&str] = &["document_one", "document_two", "document_three"];

/// Starter pandoc metadata for a new unit
const SETTINGS_TEMPLATE: &str = "\
---
title: \"Sample document\"
author: docpress
colorlinks: TRUE
code-block-font-size: \\footnotesize
...
";

/// Create a new project with default structure and sample units.
pub fn new_project(config: &ProjectConfig) -> Result<()> {
    let root = config.get_root();
    if root.exists() {
        bail!("Path `{}` already exists", root.display());
    }

    init_project_structure(config)?;
    init_default_config(root)?;
    copy_render_files(config)?;

    for unit in SAMPLE_UNITS {
        let title = unit.replace('_', " ");
        let mut title_chars = title.chars();
        let title = match title_chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + title_chars.as_str(),
            None => title,
        };
        create_unit(config, unit, &format!("# {title}\n\n"))?;
    }

    log!("init"; "Project created at {}", root.display());
    Ok(())
}

/// Import markdown files as new units named after their file stems.
pub fn import_files(config: &ProjectConfig, files: &[PathBuf]) -> Result<()> {
    for file in files {
        let unit = file
            .file_stem()
            .and_then(|s| s.to_str())
            .with_context(|| format!("Invalid file name: {}", file.display()))?
            .to_owned();
        if file.extension().is_none_or(|e| e != "md") {
            bail!("Not a markdown file: {}", file.display());
        }
        if !file.is_file() {
            bail!("File not found: {}", file.display());
        }
        if config.unit_source(&unit).exists() {
            bail!("Unit `{unit}` already exists");
        }

        let content = fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        create_unit(config, &unit, &content)?;
        log!("init"; "Imported {} as unit `{unit}`", file.display());
    }
    Ok(())
}

/// Create the project folder tree.
fn init_project_structure(config: &ProjectConfig) -> Result<()> {
    for dir in [
        &config.paths.source,
        &config.paths.markdown,
        &config.paths.html,
        &config.paths.pdf,
        &config.paths.data,
        &config.paths.links,
        &config.paths.logs,
        &config.paths.build_includes,
    ] {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    Ok(())
}

/// Write default configuration file
fn init_default_config(root: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&ProjectConfig::default())?;
    fs::write(root.join(CONFIG_FILE), content)?;
    Ok(())
}

/// Seed `build_includes/` with whatever render support files the
/// current configuration points at.
fn copy_render_files(config: &ProjectConfig) -> Result<()> {
    for file in [
        &config.render.pdf_template,
        &config.render.latex_header,
        &config.render.css,
        &config.paths.license_notice,
    ]
    .into_iter()
    .flatten()
    {
        if file.is_file() {
            let name = file.file_name().context("Invalid render file path")?;
            fs::copy(file, config.paths.build_includes.join(name))
                .with_context(|| format!("Failed to copy {}", file.display()))?;
        }
    }
    Ok(())
}

/// One unit folder with its standard subdirectories and starter files.
fn create_unit(config: &ProjectConfig, unit: &str, document: &str) -> Result<()> {
    let unit_dir = config.unit_source(unit);
    for sub in UNIT_DIRS {
        fs::create_dir_all(unit_dir.join(sub))
            .with_context(|| format!("Failed to create unit `{unit}`"))?;
    }

    fs::write(unit_dir.join("document.md"), document)?;
    fs::write(unit_dir.join("settings.yaml"), SETTINGS_TEMPLATE)?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
