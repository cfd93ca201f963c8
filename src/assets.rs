//! Content-addressed asset rewriting.
//!
//! Embedded images in a staged document are renamed to a digest of
//! their bytes and every reference in the document is rewritten to the
//! new name. Identical bytes always produce the identical name, so
//! republishing deduplicates cleanly and cache-busting is safe.
//!
//! The pass is re-entrant: a digest-named asset hashes to its own name,
//! so a second run renames nothing and rewrites nothing. The file rename
//! happens before the document is rewritten so a crash in between never
//! leaves the document pointing at a name that does not exist.

use crate::log;
use anyhow::{Context, Result};
use regex::Regex;
use std::{
    fs,
    path::Path,
    sync::OnceLock,
};

/// Embedded image reference: `![alt](path)`.
fn image_reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!\[[^\]]*\]\(([^)\s]+\.[^)\s]+)\)").unwrap())
}

/// Digest-derived file name for asset bytes, keeping the original
/// extension.
pub fn content_address(bytes: &[u8], original: &Path) -> String {
    let digest = hex::encode(blake3::hash(bytes).as_bytes());
    match original.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{digest}.{ext}"),
        None => digest,
    }
}

/// Rewrite every locally-present image reference in `document` to its
/// content-addressed name, renaming files under `includes_dir`.
///
/// References whose file is not found under the includes directory are
/// left alone (external URLs, already-renamed assets).
pub fn rewrite_document_assets(document: &Path, includes_dir: &Path) -> Result<()> {
    let mut content = fs::read_to_string(document)
        .with_context(|| format!("Failed to read {}", document.display()))?;

    let references: Vec<String> = image_reference_re()
        .captures_iter(&content)
        .map(|c| c[1].to_owned())
        .collect();

    let mut dirty = false;
    for reference in references {
        let file_name = match Path::new(&reference).file_name() {
            Some(name) => name.to_owned(),
            None => continue,
        };
        let old_path = includes_dir.join(&file_name);
        if !old_path.exists() {
            continue;
        }

        let bytes = fs::read(&old_path)
            .with_context(|| format!("Failed to read asset {}", old_path.display()))?;
        let new_name = content_address(&bytes, &old_path);
        let new_path = includes_dir.join(&new_name);

        if old_path != new_path {
            fs::rename(&old_path, &new_path).with_context(|| {
                format!("Failed to rename asset {}", old_path.display())
            })?;
            log!("assets"; "{} -> {new_name}", file_name.to_string_lossy());
        }

        let replacement = format!("includes/{new_name}");
        if reference != replacement {
            content = content.replace(&reference, &replacement);
            dirty = true;
        }
    }

    // Rewrite only after every rename has succeeded
    if dirty {
        fs::write(document, content)
            .with_context(|| format!("Failed to write {}", document.display()))?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn staged(document_body: &str, assets: &[(&str, &[u8])]) -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempdir().unwrap();
        let doc = dir.path().join("document.md");
        let includes = dir.path().join("includes");
        fs::create_dir(&includes).unwrap();
        fs::write(&doc, document_body).unwrap();
        for (name, bytes) in assets {
            fs::write(includes.join(name), bytes).unwrap();
        }
        (dir, doc, includes)
    }

    #[test]
    fn test_image_reference_re_captures_paths_not_spaced_text() {
        let re = image_reference_re();
        let caps = re.captures("![x](includes/a.png)").unwrap();
        assert_eq!(&caps[1], "includes/a.png");
        // whitespace inside the parentheses is not a reference
        assert!(re.captures("![x](my file.png)").is_none());
    }

    #[test]
    fn test_content_address_deterministic() {
        // Same bytes under two different names yield the same target
        let a = content_address(b"pixels", Path::new("one.png"));
        let b = content_address(b"pixels", Path::new("two.png"));
        assert_eq!(a, b);
        assert!(a.ends_with(".png"));
    }

    #[test]
    fn test_content_address_differs_on_content() {
        let a = content_address(b"pixels", Path::new("img.png"));
        let b = content_address(b"other", Path::new("img.png"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_rewrite_renames_and_relinks() {
        let (_dir, doc, includes) = staged(
            "# T\n\n![diagram](includes/diagram.png)\n",
            &[("diagram.png", b"pngbytes")],
        );

        rewrite_document_assets(&doc, &includes).unwrap();

        let expected = content_address(b"pngbytes", Path::new("diagram.png"));
        assert!(includes.join(&expected).exists());
        assert!(!includes.join("diagram.png").exists());

        let content = fs::read_to_string(&doc).unwrap();
        assert!(content.contains(&format!("![diagram](includes/{expected})")));
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let (_dir, doc, includes) = staged(
            "![d](includes/d.jpg)\n",
            &[("d.jpg", b"jpegbytes")],
        );

        rewrite_document_assets(&doc, &includes).unwrap();
        let after_first = fs::read_to_string(&doc).unwrap();

        rewrite_document_assets(&doc, &includes).unwrap();
        let after_second = fs::read_to_string(&doc).unwrap();

        assert_eq!(after_first, after_second);
        assert_eq!(fs::read_dir(&includes).unwrap().count(), 1);
    }

    #[test]
    fn test_rewrite_replaces_every_occurrence() {
        let (_dir, doc, includes) = staged(
            "![a](includes/pic.png)\ntext\n![b](includes/pic.png)\n",
            &[("pic.png", b"img")],
        );

        rewrite_document_assets(&doc, &includes).unwrap();

        let content = fs::read_to_string(&doc).unwrap();
        assert!(!content.contains("pic.png"));
    }

    #[test]
    fn test_rewrite_skips_missing_and_external() {
        let (_dir, doc, includes) = staged(
            "![gone](includes/gone.png)\n![ext](https://example.com/x.png)\n",
            &[],
        );

        rewrite_document_assets(&doc, &includes).unwrap();

        let content = fs::read_to_string(&doc).unwrap();
        assert!(content.contains("includes/gone.png"));
        assert!(content.contains("https://example.com/x.png"));
    }

    #[test]
    fn test_rewrite_bare_reference_without_dir() {
        // references written as `![x](img.png)` resolve by basename
        let (_dir, doc, includes) = staged(
            "![x](img.png)\n",
            &[("img.png", b"raw")],
        );

        rewrite_document_assets(&doc, &includes).unwrap();

        let expected = content_address(b"raw", Path::new("img.png"));
        let content = fs::read_to_string(&doc).unwrap();
        assert!(content.contains(&format!("includes/{expected}")));
    }
}
