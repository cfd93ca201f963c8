//! Filesystem helpers shared across the pipeline.
//!
//! All traversal skips hidden entries (any path component starting with
//! `.`), matching what the manifest considers "owned" by a unit.

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};
use walkdir::WalkDir;

/// Check whether a file name is hidden (starts with `.`).
pub fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}

/// Collect every non-hidden file under `dir`, recursively.
///
/// Returns an empty vec when the directory does not exist.
pub fn visible_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
    {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Non-hidden direct children of `dir` (files and directories).
pub fn visible_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !is_hidden(&entry.file_name()) {
            entries.push(entry.path());
        }
    }
    Ok(entries)
}

/// Non-hidden subdirectory names of `dir`, sorted.
pub fn subdir_names(dir: &Path) -> Result<Vec<String>> {
    let mut names: Vec<String> = visible_entries(dir)?
        .into_iter()
        .filter(|p| p.is_dir())
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_owned))
        .collect();
    names.sort();
    Ok(names)
}

/// Latest modification time among `files`, or `None` when empty.
pub fn max_mtime(files: &[PathBuf]) -> Result<Option<SystemTime>> {
    let mut latest = None;
    for file in files {
        let mtime = file
            .metadata()
            .and_then(|m| m.modified())
            .with_context(|| format!("Failed to stat {}", file.display()))?;
        if latest.is_none_or(|t| mtime > t) {
            latest = Some(mtime);
        }
    }
    Ok(latest)
}

/// Seconds since the unix epoch for a `SystemTime`.
pub fn unix_seconds(time: SystemTime) -> f64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Write `content` to `path` atomically via a temp file in the same
/// directory followed by a rename.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("No parent directory for {}", path.display()))?;
    fs::create_dir_all(parent)?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move {} into place", path.display()))?;
    Ok(())
}

/// Copy `src` to `dst` only when `dst` is absent or differs by content.
///
/// Full byte comparison, not metadata. Returns true when a copy happened.
pub fn copy_if_changed(src: &Path, dst: &Path) -> Result<bool> {
    if dst.exists() {
        let src_bytes = fs::read(src)?;
        let dst_bytes = fs::read(dst)?;
        if src_bytes == dst_bytes {
            return Ok(false);
        }
    }
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst).with_context(|| {
        format!("Failed to copy {} to {}", src.display(), dst.display())
    })?;
    Ok(true)
}

/// Recursively diff-copy a directory tree, skipping hidden entries.
pub fn copy_tree_if_changed(src: &Path, dst: &Path) -> Result<()> {
    for file in visible_files(src)? {
        let relative = file.strip_prefix(src)?;
        copy_if_changed(&file, &dst.join(relative))?;
    }
    Ok(())
}

/// Plain recursive copy of a directory tree, skipping hidden entries.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    for file in visible_files(src)? {
        let relative = file.strip_prefix(src)?;
        let target = dst.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&file, &target).with_context(|| {
            format!("Failed to copy {} to {}", file.display(), target.display())
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_visible_files_skips_hidden() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join(".hidden"), "h").unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/config"), "c").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.txt"), "b").unwrap();

        let mut files = visible_files(dir.path()).unwrap();
        files.sort();
        assert_eq!(
            files,
            vec![dir.path().join("a.txt"), dir.path().join("sub/b.txt")]
        );
    }

    #[test]
    fn test_visible_files_missing_dir() {
        let dir = tempdir().unwrap();
        let files = visible_files(&dir.path().join("nope")).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_subdir_names_sorted() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("zeta")).unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();
        fs::write(dir.path().join("not_a_dir.txt"), "x").unwrap();

        assert_eq!(subdir_names(dir.path()).unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_copy_if_changed_skips_identical() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.txt");
        let dst = dir.path().join("dst.txt");
        fs::write(&src, "same").unwrap();
        fs::write(&dst, "same").unwrap();

        assert!(!copy_if_changed(&src, &dst).unwrap());
    }

    #[test]
    fn test_copy_if_changed_copies_differing() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.txt");
        let dst = dir.path().join("dst.txt");
        fs::write(&src, "new").unwrap();
        fs::write(&dst, "old").unwrap();

        assert!(copy_if_changed(&src, &dst).unwrap());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "new");
    }

    #[test]
    fn test_copy_if_changed_copies_absent() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.txt");
        let dst = dir.path().join("nested/dst.txt");
        fs::write(&src, "data").unwrap();

        assert!(copy_if_changed(&src, &dst).unwrap());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "data");
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/file.txt");
        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "two");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_max_mtime_empty() {
        assert!(max_mtime(&[]).unwrap().is_none());
    }
}
