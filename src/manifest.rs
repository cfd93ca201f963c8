//! Per-unit build manifests and change detection.
//!
//! A manifest records the last successful build of a unit: a timestamp
//! and the set of files the unit owned at that moment. It is the sole
//! source of truth for "is this unit up to date". Absent manifest means
//! the unit has never built successfully.
//!
//! Two complementary checks decide whether a unit is modified:
//!
//! - *set change*: the current file set differs from the recorded one
//!   (catches additions, deletions, and renames that leave every
//!   remaining mtime untouched)
//! - *time change*: some current file is newer than the recorded
//!   timestamp (catches in-place edits that keep the set identical)
//!
//! Either alone misses real changes; both together are required.

use crate::{config::ProjectConfig, utils::fs as fsx};
use anyhow::{Context, Result};
use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

/// The two data subdirectories of a unit.
pub const DATA_DIRS: &[&str] = &["data", "data_not_tracked"];

/// Snapshot of a unit's last successful build.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    /// Seconds since the unix epoch at manifest write time.
    pub timestamp: f64,
    /// Relative paths (to the project root) of every owned file.
    pub files: BTreeSet<PathBuf>,
}

impl Manifest {
    /// Load a manifest, returning `None` when it does not exist.
    ///
    /// First line is the timestamp, remaining lines are relative paths.
    /// A bare timestamp with no file list (the older format) still
    /// parses; its empty set then always compares as changed.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;

        let mut lines = content.lines();
        let timestamp = lines
            .next()
            .unwrap_or_default()
            .trim()
            .parse::<f64>()
            .with_context(|| format!("Malformed manifest timestamp in {}", path.display()))?;

        let files = lines
            .filter(|l| !l.trim().is_empty())
            .map(PathBuf::from)
            .collect();

        Ok(Some(Self { timestamp, files }))
    }

    /// Write the manifest atomically (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut content = format!("{}\n", self.timestamp);
        for file in &self.files {
            content.push_str(&file.to_string_lossy());
            content.push('\n');
        }
        fsx::write_atomic(path, content.as_bytes())
    }

    /// Snapshot the current state of a unit for writing after a
    /// successful build.
    pub fn snapshot(config: &ProjectConfig, unit: &str) -> Result<Self> {
        let files = current_files(config, unit)?;
        Ok(Self {
            timestamp: fsx::unix_seconds(SystemTime::now()),
            files,
        })
    }
}

/// Current owned file set of a unit: every non-hidden file under its
/// source tree plus its link record when present, relative to the
/// project root.
pub fn current_files(config: &ProjectConfig, unit: &str) -> Result<BTreeSet<PathBuf>> {
    let root = config.get_root();
    let mut files = BTreeSet::new();

    for file in fsx::visible_files(&config.unit_source(unit))? {
        files.insert(relative_to_root(&file, root));
    }

    let link_record = config.unit_link_record(unit);
    if link_record.exists() {
        files.insert(relative_to_root(&link_record, root));
    }

    Ok(files)
}

/// Has the unit changed since its last successful build?
pub fn unit_modified(config: &ProjectConfig, unit: &str) -> Result<bool> {
    let Some(manifest) = Manifest::load(&config.unit_manifest(unit))? else {
        return Ok(true);
    };

    let current = current_files(config, unit)?;
    if current != manifest.files {
        return Ok(true);
    }

    newer_than(config, &current, manifest.timestamp)
}

/// Narrower check over the data subdirectories only, for deciding
/// whether the packaged archive needs regenerating without forcing a
/// full document re-render.
pub fn data_modified(config: &ProjectConfig, unit: &str) -> Result<bool> {
    let Some(manifest) = Manifest::load(&config.unit_manifest(unit))? else {
        return Ok(true);
    };

    let root = config.get_root();
    let mut current = BTreeSet::new();
    for dir in DATA_DIRS {
        for file in fsx::visible_files(&config.unit_source(unit).join(dir))? {
            current.insert(relative_to_root(&file, root));
        }
    }

    let recorded: BTreeSet<PathBuf> = manifest
        .files
        .iter()
        .filter(|p| in_data_dir(p, unit, config))
        .cloned()
        .collect();

    if current != recorded {
        return Ok(true);
    }

    newer_than(config, &current, manifest.timestamp)
}

/// True when any of `files` (relative to the root) is newer than
/// `timestamp`.
fn newer_than(
    config: &ProjectConfig,
    files: &BTreeSet<PathBuf>,
    timestamp: f64,
) -> Result<bool> {
    let root = config.get_root();
    let absolute: Vec<PathBuf> = files.iter().map(|p| root.join(p)).collect();
    match fsx::max_mtime(&absolute)? {
        Some(latest) => Ok(fsx::unix_seconds(latest) > timestamp),
        None => Ok(false),
    }
}

/// Does a manifest-relative path live under one of the unit's data dirs?
fn in_data_dir(path: &Path, unit: &str, config: &ProjectConfig) -> bool {
    let root = config.get_root();
    DATA_DIRS.iter().any(|dir| {
        let prefix = relative_to_root(&config.unit_source(unit).join(dir), root);
        path.starts_with(&prefix)
    })
}

/// Express `path` relative to the project root, falling back to the
/// path itself when it lives outside the root.
fn relative_to_root(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectConfig;
    use std::{thread, time::Duration};
    use tempfile::{TempDir, tempdir};

    /// Project skeleton with one unit containing `document.md`.
    fn project_with_unit(unit: &str) -> (TempDir, ProjectConfig) {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();

        let mut config = ProjectConfig::default();
        config.set_root(&root);
        config.paths.source = root.join("source");
        config.paths.links = root.join("data_to_share_links");
        config.paths.logs = root.join("logs");
        config.paths.data = root.join("data_to_share");

        fs::create_dir_all(config.unit_source(unit)).unwrap();
        fs::create_dir_all(&config.paths.links).unwrap();
        fs::create_dir_all(&config.paths.logs).unwrap();
        fs::write(config.unit_source(unit).join("document.md"), "# Title\n").unwrap();

        (dir, config)
    }

    #[test]
    fn test_absent_manifest_means_modified() {
        let (_dir, config) = project_with_unit("intro");
        assert!(unit_modified(&config, "intro").unwrap());
        assert!(data_modified(&config, "intro").unwrap());
    }

    #[test]
    fn test_idempotence_after_snapshot() {
        let (_dir, config) = project_with_unit("intro");

        let manifest = Manifest::snapshot(&config, "intro").unwrap();
        manifest.save(&config.unit_manifest("intro")).unwrap();

        assert!(!unit_modified(&config, "intro").unwrap());
        assert!(!data_modified(&config, "intro").unwrap());
    }

    #[test]
    fn test_set_difference_sensitivity() {
        // Manifest lists {A, B}; current tree has {A, C}. Modified must
        // hold regardless of any mtime.
        let (_dir, config) = project_with_unit("intro");
        let src = config.unit_source("intro");
        fs::write(src.join("b.md"), "b").unwrap();

        let manifest = Manifest::snapshot(&config, "intro").unwrap();
        manifest.save(&config.unit_manifest("intro")).unwrap();

        fs::remove_file(src.join("b.md")).unwrap();
        fs::write(src.join("c.md"), "c").unwrap();
        // keep c's mtime older than the manifest timestamp
        let mut stale = manifest.clone();
        stale.timestamp = fsx::unix_seconds(SystemTime::now()) + 3600.0;
        stale.save(&config.unit_manifest("intro")).unwrap();

        assert!(unit_modified(&config, "intro").unwrap());
    }

    #[test]
    fn test_mtime_sensitivity() {
        let (_dir, config) = project_with_unit("intro");

        let manifest = Manifest::snapshot(&config, "intro").unwrap();
        manifest.save(&config.unit_manifest("intro")).unwrap();

        // Same file set, newer content
        thread::sleep(Duration::from_millis(20));
        fs::write(config.unit_source("intro").join("document.md"), "# Edited\n").unwrap();

        assert!(unit_modified(&config, "intro").unwrap());
    }

    #[test]
    fn test_link_record_participates_in_file_set() {
        let (_dir, config) = project_with_unit("intro");

        let manifest = Manifest::snapshot(&config, "intro").unwrap();
        manifest.save(&config.unit_manifest("intro")).unwrap();
        assert!(!unit_modified(&config, "intro").unwrap());

        // A link record appearing is a set change
        fs::write(config.unit_link_record("intro"), "").unwrap();
        assert!(unit_modified(&config, "intro").unwrap());
    }

    #[test]
    fn test_data_modified_ignores_document_edits() {
        let (_dir, config) = project_with_unit("intro");
        let src = config.unit_source("intro");
        fs::create_dir_all(src.join("data")).unwrap();
        fs::write(src.join("data/set.csv"), "1,2\n").unwrap();

        let manifest = Manifest::snapshot(&config, "intro").unwrap();
        manifest.save(&config.unit_manifest("intro")).unwrap();

        thread::sleep(Duration::from_millis(20));
        fs::write(src.join("document.md"), "# Edited\n").unwrap();

        assert!(unit_modified(&config, "intro").unwrap());
        assert!(!data_modified(&config, "intro").unwrap());
    }

    #[test]
    fn test_data_modified_sees_data_changes() {
        let (_dir, config) = project_with_unit("intro");
        let src = config.unit_source("intro");
        fs::create_dir_all(src.join("data_not_tracked")).unwrap();

        let manifest = Manifest::snapshot(&config, "intro").unwrap();
        manifest.save(&config.unit_manifest("intro")).unwrap();

        fs::write(src.join("data_not_tracked/new.bin"), "x").unwrap();
        assert!(data_modified(&config, "intro").unwrap());
    }

    #[test]
    fn test_hidden_files_excluded() {
        let (_dir, config) = project_with_unit("intro");

        let manifest = Manifest::snapshot(&config, "intro").unwrap();
        manifest.save(&config.unit_manifest("intro")).unwrap();

        // ensure the timestamp check cannot fire for the hidden file
        let mut future = Manifest::load(&config.unit_manifest("intro"))
            .unwrap()
            .unwrap();
        future.timestamp = fsx::unix_seconds(SystemTime::now()) + 3600.0;
        future.save(&config.unit_manifest("intro")).unwrap();

        fs::write(config.unit_source("intro").join(".DS_Store"), "junk").unwrap();
        assert!(!unit_modified(&config, "intro").unwrap());
    }

    #[test]
    fn test_manifest_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs/intro/manifest.txt");

        let manifest = Manifest {
            timestamp: 1700000000.25,
            files: [PathBuf::from("source/intro/document.md")]
                .into_iter()
                .collect(),
        };
        manifest.save(&path).unwrap();

        let loaded = Manifest::load(&path).unwrap().unwrap();
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn test_manifest_timestamp_only_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.txt");
        fs::write(&path, "1700000000.0\n").unwrap();

        let loaded = Manifest::load(&path).unwrap().unwrap();
        assert!(loaded.files.is_empty());
    }

    #[test]
    fn test_manifest_malformed_timestamp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.txt");
        fs::write(&path, "not-a-number\n").unwrap();

        assert!(Manifest::load(&path).is_err());
    }
}
