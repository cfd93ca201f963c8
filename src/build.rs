//! Build orchestration.
//!
//! Discovers units, decides which ones changed, and runs the per-unit
//! pipeline. Units are independent, so they build in parallel; one
//! unit failing only excludes that unit from its manifest update, the
//! rest keep going and the failures are summarized at the end.
//!
//! Per-unit stage order matters: the placeholder substitution and the
//! assignment split must see the asset-rewritten document, the PDF
//! render must run before page breaks are stripped, and the manifest
//! is written last so a crash anywhere re-processes the unit next run.

use crate::{
    assets, assignment, archive, config::ProjectConfig, links, log,
    manifest::{self, Manifest},
    publish, render,
    utils::fs::{copy_tree, subdir_names},
    validate,
};
use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
};

const LINK_PLACEHOLDER: &str = "[DATA_DOWNLOAD_LINK]";

/// Line width the substituted download link is wrapped to.
const LINK_LINE_WIDTH: usize = 50;

/// Run a full build, then publish.
pub fn build(config: &'static ProjectConfig) -> Result<()> {
    let build_args = config.get_cli().build_args().context("Not a build command")?;

    let units = subdir_names(&config.paths.source)?;
    if units.is_empty() {
        log!("build"; "No units under {}", config.paths.source.display());
        return Ok(());
    }

    let modified = if build_args.force {
        units.clone()
    } else {
        changed_units(config, &units)?
    };

    package_archives(config, &units, build_args.force)?;
    process_and_publish(config, &units, &modified, build_args.assignment)
}

/// Process the modified units, then validate and publish regardless of
/// per-unit failures. A failed unit keeps a stale manifest and the
/// summary error is returned last, so healthy siblings still ship.
fn process_and_publish(
    config: &ProjectConfig,
    units: &[String],
    modified: &[String],
    assignment: bool,
) -> Result<()> {
    let processed = if modified.is_empty() {
        log!("build"; "All units up to date");
        Ok(())
    } else {
        log!("build"; "Processing {} unit(s)", modified.len());
        process_units(config, modified, assignment)
    };

    let validated = if config.validate.only_modified {
        modified
    } else {
        units
    };
    for unit in validated {
        validate::validate_unit(config, unit)?;
    }

    publish::publish_all(config)?;
    processed
}

/// Units whose source set or timestamps moved past their manifest.
fn changed_units(config: &ProjectConfig, units: &[String]) -> Result<Vec<String>> {
    let mut changed = Vec::new();
    for unit in units {
        if manifest::unit_modified(config, unit)? {
            changed.push(unit.clone());
        }
    }
    Ok(changed)
}

/// Package data archives for units whose data folders changed, then
/// make sure every unit with an archive has a link record.
fn package_archives(config: &ProjectConfig, units: &[String], force: bool) -> Result<()> {
    for unit in units {
        if force || manifest::data_modified(config, unit)? {
            if archive::package_unit_data(config, unit)? {
                log!("archive"; "{unit}: packaged data archive");
            }
        }
    }
    links::ensure_link_records(config, units)
}

/// Fan the per-unit pipeline out over the thread pool, collecting
/// failures instead of aborting siblings.
fn process_units(config: &ProjectConfig, units: &[String], assignment: bool) -> Result<()> {
    let failures: Vec<String> = units
        .par_iter()
        .filter_map(|unit| match process_unit(config, unit, assignment) {
            Ok(()) => None,
            Err(error) => {
                log!("error"; "{unit}: {error:#}");
                Some(unit.clone())
            }
        })
        .collect();

    if !failures.is_empty() {
        bail!("{} unit(s) failed: {}", failures.len(), failures.join(", "));
    }
    Ok(())
}

fn process_unit(config: &ProjectConfig, unit: &str, assignment: bool) -> Result<()> {
    // snapshot first, so edits racing the build re-trigger next run
    let snapshot = Manifest::snapshot(config, unit)?;

    let staged = stage_unit(config, unit)?;
    assets::rewrite_document_assets(&staged, &config.paths.markdown.join(unit).join("includes"))?;
    substitute_download_link(config, unit, &staged)?;

    let documents = if assignment {
        split_assignment_variants(&staged)?
    } else {
        vec![staged]
    };

    for document in &documents {
        let pdf = output_path(&config.paths.pdf, unit, document, "pdf")?;
        render::render_pdf(config, unit, document, &pdf)?;
    }
    for document in &documents {
        strip_pagebreaks(document)?;
        let html = output_path(&config.paths.html, unit, document, "html")?;
        render::render_html(config, unit, document, &html)?;
    }

    snapshot.save(&config.unit_manifest(unit))?;
    Ok(())
}

/// Copy `document.md` and `includes/` into markdown staging.
fn stage_unit(config: &ProjectConfig, unit: &str) -> Result<PathBuf> {
    let source = config.unit_source(unit);
    let document = source.join("document.md");
    if !document.is_file() {
        bail!("No document.md in {}", source.display());
    }

    let staged_dir = config.paths.markdown.join(unit);
    fs::create_dir_all(&staged_dir)?;
    let staged = staged_dir.join("document.md");
    fs::copy(&document, &staged)
        .with_context(|| format!("Failed to stage {}", document.display()))?;

    let includes = source.join("includes");
    if includes.exists() {
        let target = staged_dir.join("includes");
        if target.exists() {
            fs::remove_dir_all(&target)?;
        }
        copy_tree(&includes, &target)?;
    }

    Ok(staged)
}

/// Rendered output path mirroring the staged document's file stem.
fn output_path(
    kind_root: &Path,
    unit: &str,
    document: &Path,
    extension: &str,
) -> Result<PathBuf> {
    let stem = document
        .file_stem()
        .and_then(|s| s.to_str())
        .context("Invalid staged document name")?;
    Ok(kind_root.join(unit).join(format!("{stem}.{extension}")))
}

/// Write the three assignment variants next to the staged document and
/// drop the combined file from the render set.
fn split_assignment_variants(staged: &Path) -> Result<Vec<PathBuf>> {
    let content = fs::read_to_string(staged)?;
    assignment::validate_structure(&content)?;

    let mut variants = Vec::new();
    for variant in assignment::Variant::ALL {
        let text = assignment::split_variant(&content, variant)?;
        let path = staged.with_file_name(format!("document_{}.md", variant.suffix()));
        fs::write(&path, text)?;
        variants.push(path);
    }
    // keep only the variants in staging; the combined document holds
    // instructor content and must not publish
    fs::remove_file(staged)?;
    Ok(variants)
}

// ============================================================================
// Text passes over the staged document
// ============================================================================

/// Replace the download placeholder with the unit's recorded link,
/// wrapped to fixed-width lines joined by trailing backslashes and
/// quoted as a whole.
fn substitute_download_link(
    config: &ProjectConfig,
    unit: &str,
    staged: &Path,
) -> Result<()> {
    let content = fs::read_to_string(staged)?;
    if !content.contains(LINK_PLACEHOLDER) {
        return Ok(());
    }
    let Some(link) = links::read_link(config, unit)? else {
        log!("warn"; "{unit}: no download link recorded yet, placeholder left in place");
        return Ok(());
    };

    fs::write(staged, content.replace(LINK_PLACEHOLDER, &wrap_link(&link)))?;
    Ok(())
}

fn wrap_link(link: &str) -> String {
    let chars: Vec<char> = link.chars().collect();
    let chunks: Vec<String> = chars
        .chunks(LINK_LINE_WIDTH)
        .map(|c| c.iter().collect())
        .collect();
    format!("\"{}\"", chunks.join("\\\n"))
}

/// Remove `\pagebreak` lines (and one following blank line) from a
/// staged document. Runs after the PDF render, before the HTML render.
fn strip_pagebreaks(staged: &Path) -> Result<()> {
    let content = fs::read_to_string(staged)?;
    let mut out = String::with_capacity(content.len());

    let mut lines = content.lines().peekable();
    while let Some(line) = lines.next() {
        if line.trim() == "\\pagebreak" {
            if lines.peek().is_some_and(|next| next.trim().is_empty()) {
                lines.next();
            }
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }

    fs::write(staged, out)?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
