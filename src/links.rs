//! Shareable-link records.
//!
//! One plain-text file per unit holding the current shareable URL of
//! its data archive, or nothing while the link is pending assignment.
//! Records are created empty the first time an archive exists and
//! rewritten only when the URL actually changes, since a write would
//! re-trigger change detection for the unit.

use crate::config::ProjectConfig;
use anyhow::{Context, Result};
use std::fs;

/// Ensure an (empty) link record exists for every unit that currently
/// has an archive. Existing records are left untouched.
pub fn ensure_link_records(config: &ProjectConfig, units: &[String]) -> Result<()> {
    fs::create_dir_all(&config.paths.links)?;
    for unit in units {
        if !config.unit_archive(unit).exists() {
            continue;
        }
        let record = config.unit_link_record(unit);
        if !record.exists() {
            fs::write(&record, "")
                .with_context(|| format!("Failed to create link record for {unit}"))?;
        }
    }
    Ok(())
}

/// Read a unit's recorded link, trimmed. `None` when the record is
/// absent or empty.
pub fn read_link(config: &ProjectConfig, unit: &str) -> Result<Option<String>> {
    let record = config.unit_link_record(unit);
    if !record.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&record)
        .with_context(|| format!("Failed to read link record for {unit}"))?;
    let link = content.trim();
    Ok((!link.is_empty()).then(|| link.to_owned()))
}

/// Persist `link` for a unit only when it differs from what is already
/// recorded. Returns true when a write happened.
pub fn write_link_if_changed(config: &ProjectConfig, unit: &str, link: &str) -> Result<bool> {
    if read_link(config, unit)?.as_deref() == Some(link) {
        return Ok(false);
    }
    fs::create_dir_all(&config.paths.links)?;
    fs::write(config.unit_link_record(unit), link)
        .with_context(|| format!("Failed to write link record for {unit}"))?;
    Ok(true)
}
