//! External document rendering.
//!
//! Invokes the configured renderer (pandoc) once per target format. A
//! renderer failure is a per-unit stage error: the caller excludes the
//! unit from its manifest update and moves on.

use crate::{
    config::ProjectConfig,
    utils::tool::{self, to_args},
};
use anyhow::{Context, Result};
use std::{
    ffi::OsString,
    fs,
    path::Path,
};

/// Render a staged markdown file to PDF.
///
/// The unit's `settings.yaml` is passed as a metadata file when it
/// exists; template, engine, highlight style, and LaTeX header come
/// from `[render]`. The resource path points at the staged unit folder
/// so relative includes resolve.
pub fn render_pdf(
    config: &ProjectConfig,
    unit: &str,
    markdown_file: &Path,
    output_file: &Path,
) -> Result<()> {
    if let Some(parent) = output_file.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut args: Vec<OsString> = to_args([markdown_file.as_os_str(), "-o".as_ref(), output_file.as_os_str()]);

    let settings = config.unit_source(unit).join("settings.yaml");
    if settings.exists() {
        args.extend(to_args(["--metadata-file".into(), settings.into_os_string()]));
    }
    if let Some(engine) = &config.render.pdf_engine {
        args.extend(to_args(["--pdf-engine", engine.as_str()]));
    }
    if let Some(template) = &config.render.pdf_template {
        args.extend(to_args(["--template".into(), template.clone().into_os_string()]));
    }
    if let Some(style) = &config.render.highlight_style {
        args.extend(to_args(["--highlight-style", style.as_str()]));
    }
    if let Some(header) = &config.render.latex_header {
        args.extend(to_args(["-H".into(), header.clone().into_os_string()]));
    }

    let resource_path = config.paths.markdown.join(unit);
    args.extend(to_args(["--resource-path".into(), resource_path.into_os_string()]));

    tool::run(None, &config.render.command, &args)?
        .into_result("render pdf")
        .map(drop)
}

/// Render a staged markdown file to standalone HTML.
///
/// The configured stylesheet is copied into a `styles/` folder beside
/// the output and linked relatively, and the staged `includes/` folder
/// is mirrored so image references keep resolving.
pub fn render_html(
    config: &ProjectConfig,
    unit: &str,
    markdown_file: &Path,
    output_file: &Path,
) -> Result<()> {
    let html_dir = output_file
        .parent()
        .context("HTML output file has no parent")?;
    fs::create_dir_all(html_dir)?;

    let mut args: Vec<OsString> = to_args([
        markdown_file.as_os_str(),
        "--standalone".as_ref(),
        "-o".as_ref(),
        output_file.as_os_str(),
    ]);

    if let Some(css) = &config.render.css {
        let styles = html_dir.join("styles");
        fs::create_dir_all(&styles)?;
        let css_name = css.file_name().context("Invalid css path")?;
        fs::copy(css, styles.join(css_name))
            .with_context(|| format!("Failed to copy stylesheet for {unit}"))?;

        let relative_css = Path::new("styles").join(css_name);
        args.extend(to_args(["--css".into(), relative_css.into_os_string()]));
    }

    let settings = config.unit_source(unit).join("settings.yaml");
    if settings.exists() {
        args.extend(to_args(["--metadata-file".into(), settings.into_os_string()]));
    }

    // Mirror staged includes so the rendered page finds its images
    let staged_includes = config.paths.markdown.join(unit).join("includes");
    if staged_includes.exists() {
        let target = html_dir.join("includes");
        if target.exists() {
            fs::remove_dir_all(&target)?;
        }
        crate::utils::fs::copy_tree(&staged_includes, &target)?;
    }

    tool::run(None, &config.render.command, &args)?
        .into_result("render html")
        .map(drop)
}
