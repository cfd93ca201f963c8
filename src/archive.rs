//! Data archive packaging.
//!
//! Collects a unit's data files into a single `<unit>.tar.gz`. The
//! archive's presence is the only signal that a unit has shareable
//! data: a unit with no visible data files produces no archive at all,
//! which consumers distinguish from "not yet built" by a plain
//! existence check.

use crate::{config::ProjectConfig, log, manifest::DATA_DIRS, utils::fs as fsx};
use anyhow::{Context, Result};
use flate2::{Compression, write::GzEncoder};
use std::{fs, path::Path};

/// Name of the license notice injected into archives that lack one.
const LICENSE_FILE: &str = "LICENSE.txt";

/// Package a unit's data directories into `<paths.data>/<unit>.tar.gz`.
///
/// Returns false (and produces nothing) when both data directories are
/// empty or absent. The archive lands via temp file + rename, and the
/// uncompressed staging copy is removed afterwards.
pub fn package_unit_data(config: &ProjectConfig, unit: &str) -> Result<bool> {
    let staging = config.paths.data.join(unit);
    let source = config.unit_source(unit);

    let mut staged_any = false;
    for dir in DATA_DIRS {
        let data_dir = source.join(dir);
        let files = fsx::visible_files(&data_dir)?;
        if files.is_empty() {
            continue;
        }
        fs::create_dir_all(&staging)?;
        for file in files {
            let relative = file.strip_prefix(&data_dir)?;
            let target = staging.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&file, &target).with_context(|| {
                format!("Failed to stage {} for {unit}", file.display())
            })?;
        }
        staged_any = true;
    }

    if !staged_any {
        return Ok(false);
    }

    if let Some(notice) = &config.paths.license_notice {
        let target = staging.join(LICENSE_FILE);
        if !target.exists() {
            fs::copy(notice, &target)
                .with_context(|| format!("Failed to inject license notice for {unit}"))?;
        }
    }

    let archive = config.unit_archive(unit);
    compress_dir(&staging, &archive, unit)?;
    fs::remove_dir_all(&staging)
        .with_context(|| format!("Failed to remove staging copy for {unit}"))?;

    log!("archive"; "{}", archive.display());
    Ok(true)
}

/// Tar + gzip `dir` into `archive`, rooted at the directory's name.
fn compress_dir(dir: &Path, archive: &Path, root_name: &str) -> Result<()> {
    let tmp = archive.with_extension("gz.tmp");
    let file = fs::File::create(&tmp)
        .with_context(|| format!("Failed to create {}", tmp.display()))?;
    let encoder = GzEncoder::new(file, Compression::default());

    let mut builder = tar::Builder::new(encoder);
    builder
        .append_dir_all(root_name, dir)
        .with_context(|| format!("Failed to archive {}", dir.display()))?;
    builder
        .into_inner()
        .and_then(|gz| gz.finish())
        .with_context(|| format!("Failed to finish {}", archive.display()))?;

    fs::rename(&tmp, archive)
        .with_context(|| format!("Failed to move {} into place", archive.display()))?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
