//! Publishing staged artifacts to external destinations.
//!
//! Each artifact kind has its own optional destination under
//! `[publish]`. A destination that is unset, or whose folder does not
//! exist, is skipped without error. Files are copied only when absent
//! or byte-different at the destination, so downstream sync tools see
//! stable mtimes for unchanged content.
//!
//! After copying, the aggregate index (`index.html` for HTML,
//! `README.md` for markdown) is regenerated from the destination's
//! current contents, so units published by earlier runs stay listed.

use crate::{
    config::ProjectConfig,
    log,
    utils::fs::{copy_if_changed, copy_tree_if_changed, subdir_names, visible_entries},
};
use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Names the aggregate index must not treat as units.
const RESERVED: [&str; 4] = ["index.html", "README.md", "styles", "includes"];

/// Publish every configured kind. Called after a successful build.
pub fn publish_all(config: &ProjectConfig) -> Result<()> {
    publish_pdfs(config)?;
    publish_markdown(config)?;
    publish_html(config)?;
    publish_data(config)?;
    Ok(())
}

/// Order unit names by `document_order` position, then case-insensitive
/// alphabetical for units the order does not mention.
fn ordered_units(mut units: Vec<String>, order: &[String]) -> Vec<String> {
    units.sort_by_cached_key(|unit| {
        let position = order
            .iter()
            .position(|o| o == unit)
            .unwrap_or(usize::MAX);
        (position, unit.to_lowercase())
    });
    units
}

fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

/// Destination folder for one kind, or `None` when publishing this
/// kind is disabled (unset or the folder is missing).
fn active_destination<'a>(kind: &str, dest: &'a Option<PathBuf>) -> Option<&'a Path> {
    let dest = dest.as_deref()?;
    if !dest.exists() {
        log!("publish"; "{kind} destination missing, skipping: {}", dest.display());
        return None;
    }
    Some(dest)
}

// ============================================================================
// Per-kind publishers
// ============================================================================

/// PDFs flatten into the destination root as `<unit>.pdf` (and
/// `<unit>_<variant>.pdf` for assignment variants).
fn publish_pdfs(config: &ProjectConfig) -> Result<()> {
    let Some(dest) = active_destination("pdf", &config.publish.pdf) else {
        return Ok(());
    };

    for unit in subdir_names(&config.paths.pdf)? {
        let unit_dir = config.paths.pdf.join(&unit);
        for file in visible_entries(&unit_dir)? {
            if file.extension().is_none_or(|e| e != "pdf") {
                continue;
            }
            let stem = file
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Invalid pdf file name")?;
            let flat_name = match stem.strip_prefix("document") {
                Some("") => format!("{unit}.pdf"),
                Some(suffix) => format!("{unit}{suffix}.pdf"),
                None => format!("{unit}_{stem}.pdf"),
            };
            copy_if_changed(&file, &dest.join(flat_name))?;
        }
    }
    Ok(())
}

/// Markdown publishes per-unit folders (`.md` plus `includes/`) under
/// `<dest>/markdown` and rebuilds the `README.md` table of contents.
fn publish_markdown(config: &ProjectConfig) -> Result<()> {
    let Some(dest) = active_destination("markdown", &config.publish.markdown) else {
        return Ok(());
    };
    let dest = dest.join("markdown");
    fs::create_dir_all(&dest)?;

    for unit in subdir_names(&config.paths.markdown)? {
        let unit_dir = config.paths.markdown.join(&unit);
        for file in visible_entries(&unit_dir)? {
            if file.extension().is_some_and(|e| e == "md") {
                let name = file.file_name().context("Invalid markdown file name")?;
                copy_if_changed(&file, &dest.join(&unit).join(name))?;
            }
        }
        let includes = unit_dir.join("includes");
        if includes.exists() {
            copy_tree_if_changed(&includes, &dest.join(&unit).join("includes"))?;
        }
    }

    write_markdown_index(config, &dest)
}

/// HTML publishes per-unit folders plus the shared stylesheet under
/// `<dest>/html` and rebuilds the `index.html` table of contents.
fn publish_html(config: &ProjectConfig) -> Result<()> {
    let Some(dest) = active_destination("html", &config.publish.html) else {
        return Ok(());
    };
    let dest = dest.join("html");
    fs::create_dir_all(&dest)?;

    if let Some(css) = &config.render.css {
        let css_name = css.file_name().context("Invalid css path")?;
        copy_if_changed(css, &dest.join("styles").join(css_name))?;
    }

    for unit in subdir_names(&config.paths.html)? {
        let unit_dir = config.paths.html.join(&unit);
        for file in visible_entries(&unit_dir)? {
            if file.extension().is_some_and(|e| e == "html") {
                let name = file.file_name().context("Invalid html file name")?;
                copy_if_changed(&file, &dest.join(&unit).join(name))?;
            }
        }
        for support in ["includes", "styles"] {
            let support_dir = unit_dir.join(support);
            if support_dir.exists() {
                copy_tree_if_changed(&support_dir, &dest.join(&unit).join(support))?;
            }
        }
    }

    write_html_index(config, &dest)
}

/// Data archives flatten into the destination root.
fn publish_data(config: &ProjectConfig) -> Result<()> {
    let Some(dest) = active_destination("data", &config.publish.data) else {
        return Ok(());
    };

    for file in visible_entries(&config.paths.data)? {
        let is_archive = file
            .extension()
            .is_some_and(|e| e == "gz" || e == "zip");
        if file.is_file() && is_archive {
            let name = file.file_name().context("Invalid archive file name")?;
            copy_if_changed(&file, &dest.join(name))?;
        }
    }
    Ok(())
}

// ============================================================================
// Aggregate indexes
// ============================================================================

/// Destination unit folders that hold at least one main or variant
/// document of the given extension.
fn indexable_units(config: &ProjectConfig, dest: &Path, extension: &str) -> Result<Vec<String>> {
    let mut units = Vec::new();
    for name in subdir_names(dest)? {
        if is_reserved(&name) {
            continue;
        }
        if !unit_documents(dest, &name, extension)?.is_empty() {
            units.push(name);
        }
    }
    Ok(ordered_units(units, &config.paths.document_order))
}

/// Document file stems published for one unit: `document` plus any
/// `document_<variant>` files, sorted by name.
fn unit_documents(dest: &Path, unit: &str, extension: &str) -> Result<Vec<String>> {
    let mut stems: Vec<String> = visible_entries(&dest.join(unit))?
        .into_iter()
        .filter(|file| file.extension().is_some_and(|e| e == extension))
        .filter_map(|file| {
            file.file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_owned)
        })
        .filter(|stem| stem == "document" || stem.starts_with("document_"))
        .collect();
    stems.sort();
    Ok(stems)
}

/// Index label for one published document, mirroring the flattened pdf
/// naming (`document` -> unit, `document_student` -> `<unit>_student`).
fn document_label(unit: &str, stem: &str) -> String {
    match stem.strip_prefix("document") {
        Some("") | None => unit.to_owned(),
        Some(suffix) => format!("{unit}{suffix}"),
    }
}

fn write_markdown_index(config: &ProjectConfig, dest: &Path) -> Result<()> {
    let mut lines = vec!["# Table of Contents".to_owned(), String::new()];
    for unit in indexable_units(config, dest, "md")? {
        for stem in unit_documents(dest, &unit, "md")? {
            let escaped = document_label(&unit, &stem).replace('_', "\\_");
            lines.push(format!("- [{escaped}]({unit}/{stem}.md)"));
        }
    }
    lines.push(String::new());
    fs::write(dest.join("README.md"), lines.join("\n"))?;
    Ok(())
}

fn write_html_index(config: &ProjectConfig, dest: &Path) -> Result<()> {
    let mut lines = Vec::new();
    if let Some(css) = &config.render.css {
        if let Some(name) = css.file_name().and_then(|n| n.to_str()) {
            lines.push(format!(
                "<head><link rel=\"stylesheet\" type=\"text/css\" href=\"styles/{name}\"></head>"
            ));
        }
    }
    lines.push("<h1>Table of Contents</h1>".to_owned());
    for unit in indexable_units(config, dest, "html")? {
        for stem in unit_documents(dest, &unit, "html")? {
            let label = document_label(&unit, &stem);
            lines.push(format!("<a href=\"{unit}/{stem}.html\">{label}</a><br>"));
        }
    }
    fs::write(dest.join("index.html"), lines.join("\n"))?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn project(root: &Path) -> ProjectConfig {
        let mut config = ProjectConfig::default();
        config.set_root(root);
        config.paths.markdown = root.join("markdown");
        config.paths.html = root.join("html");
        config.paths.pdf = root.join("pdf");
        config.paths.data = root.join("data_to_share");
        config
    }

    fn stage_markdown_unit(config: &ProjectConfig, unit: &str, content: &str) {
        let dir = config.paths.markdown.join(unit);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("document.md"), content).unwrap();
    }

    #[test]
    fn test_unset_destination_is_skipped() {
        let dir = tempdir().unwrap();
        let config = project(dir.path());
        publish_all(&config).unwrap();
    }

    #[test]
    fn test_missing_destination_folder_is_skipped() {
        let dir = tempdir().unwrap();
        let mut config = project(dir.path());
        config.publish.markdown = Some(dir.path().join("never-created"));
        stage_markdown_unit(&config, "intro", "# Intro\n");

        publish_all(&config).unwrap();
        assert!(!dir.path().join("never-created").exists());
    }

    #[test]
    fn test_markdown_publish_and_index() {
        let dir = tempdir().unwrap();
        let mut config = project(dir.path());
        let dest = dir.path().join("pub");
        fs::create_dir_all(&dest).unwrap();
        config.publish.markdown = Some(dest.clone());
        config.paths.document_order = vec!["setup".into(), "intro".into()];

        stage_markdown_unit(&config, "intro", "# Intro\n");
        stage_markdown_unit(&config, "setup", "# Setup\n");
        stage_markdown_unit(&config, "extra_notes", "# Extra\n");

        publish_all(&config).unwrap();

        let published = dest.join("markdown");
        assert_eq!(
            fs::read_to_string(published.join("intro/document.md")).unwrap(),
            "# Intro\n"
        );

        let readme = fs::read_to_string(published.join("README.md")).unwrap();
        let setup_at = readme.find("[setup]").unwrap();
        let intro_at = readme.find("[intro]").unwrap();
        let extra_at = readme.find("[extra\\_notes]").unwrap();
        // document_order first, unordered units after, underscores escaped
        assert!(setup_at < intro_at);
        assert!(intro_at < extra_at);
    }

    #[test]
    fn test_unchanged_file_is_not_rewritten() {
        let dir = tempdir().unwrap();
        let mut config = project(dir.path());
        let dest = dir.path().join("pub");
        fs::create_dir_all(&dest).unwrap();
        config.publish.markdown = Some(dest.clone());

        stage_markdown_unit(&config, "intro", "# Intro\n");
        publish_all(&config).unwrap();

        let published = dest.join("markdown/intro/document.md");
        let before = fs::metadata(&published).unwrap().modified().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));

        publish_all(&config).unwrap();
        let after = fs::metadata(&published).unwrap().modified().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_index_lists_previously_published_units() {
        let dir = tempdir().unwrap();
        let mut config = project(dir.path());
        let dest = dir.path().join("pub");
        // a unit published by an earlier run, absent from staging now
        fs::create_dir_all(dest.join("markdown/old_unit")).unwrap();
        fs::write(dest.join("markdown/old_unit/document.md"), "# Old\n").unwrap();
        config.publish.markdown = Some(dest.clone());

        stage_markdown_unit(&config, "intro", "# Intro\n");
        publish_all(&config).unwrap();

        let readme = fs::read_to_string(dest.join("markdown/README.md")).unwrap();
        assert!(readme.contains("[intro](intro/document.md)"));
        assert!(readme.contains("old\\_unit"));
    }

    #[test]
    fn test_index_lists_assignment_variants() {
        let dir = tempdir().unwrap();
        let mut config = project(dir.path());
        let dest = dir.path().join("pub");
        fs::create_dir_all(&dest).unwrap();
        config.publish.markdown = Some(dest.clone());
        config.publish.html = Some(dest.clone());

        // an assignment unit stages only variant documents
        let md = config.paths.markdown.join("exercise");
        fs::create_dir_all(&md).unwrap();
        fs::write(md.join("document_instructor.md"), "# Ex\n").unwrap();
        fs::write(md.join("document_student.md"), "# Ex\n").unwrap();

        let html = config.paths.html.join("exercise");
        fs::create_dir_all(&html).unwrap();
        fs::write(html.join("document_student.html"), "<html></html>").unwrap();

        publish_all(&config).unwrap();

        let readme = fs::read_to_string(dest.join("markdown/README.md")).unwrap();
        assert!(readme.contains("[exercise\\_instructor](exercise/document_instructor.md)"));
        assert!(readme.contains("[exercise\\_student](exercise/document_student.md)"));

        let index = fs::read_to_string(dest.join("html/index.html")).unwrap();
        assert!(index
            .contains("<a href=\"exercise/document_student.html\">exercise_student</a>"));
    }

    #[test]
    fn test_pdf_flattening() {
        let dir = tempdir().unwrap();
        let mut config = project(dir.path());
        let dest = dir.path().join("pdfpub");
        fs::create_dir_all(&dest).unwrap();
        config.publish.pdf = Some(dest.clone());

        let unit_dir = config.paths.pdf.join("intro");
        fs::create_dir_all(&unit_dir).unwrap();
        fs::write(unit_dir.join("document.pdf"), "%PDF main").unwrap();
        fs::write(unit_dir.join("document_student.pdf"), "%PDF student").unwrap();

        publish_all(&config).unwrap();
        assert!(dest.join("intro.pdf").exists());
        assert!(dest.join("intro_student.pdf").exists());
    }

    #[test]
    fn test_data_publish_filters_archives() {
        let dir = tempdir().unwrap();
        let mut config = project(dir.path());
        let dest = dir.path().join("datapub");
        fs::create_dir_all(&dest).unwrap();
        config.publish.data = Some(dest.clone());

        fs::create_dir_all(&config.paths.data).unwrap();
        fs::write(config.paths.data.join("intro.tar.gz"), "gz").unwrap();
        fs::write(config.paths.data.join("notes.zip"), "zip").unwrap();
        fs::write(config.paths.data.join("stray.txt"), "no").unwrap();

        publish_all(&config).unwrap();
        assert!(dest.join("intro.tar.gz").exists());
        assert!(dest.join("notes.zip").exists());
        assert!(!dest.join("stray.txt").exists());
    }

    #[test]
    fn test_html_publish_with_styles() {
        let dir = tempdir().unwrap();
        let mut config = project(dir.path());
        let dest = dir.path().join("htmlpub");
        fs::create_dir_all(&dest).unwrap();
        config.publish.html = Some(dest.clone());

        let css = dir.path().join("style.css");
        fs::write(&css, "body{}").unwrap();
        config.render.css = Some(css);

        let unit_dir = config.paths.html.join("intro");
        fs::create_dir_all(unit_dir.join("includes")).unwrap();
        fs::write(unit_dir.join("document.html"), "<html></html>").unwrap();
        fs::write(unit_dir.join("includes/img.png"), "img").unwrap();

        publish_all(&config).unwrap();

        let published = dest.join("html");
        assert!(published.join("intro/document.html").exists());
        assert!(published.join("intro/includes/img.png").exists());
        assert!(published.join("styles/style.css").exists());

        let index = fs::read_to_string(published.join("index.html")).unwrap();
        assert!(index.contains("styles/style.css"));
        assert!(index.contains("<a href=\"intro/document.html\">intro</a>"));
    }

    #[test]
    fn test_ordered_units_ordering() {
        let order = vec!["b".to_owned(), "a".to_owned()];
        let units = vec![
            "a".to_owned(),
            "Zulu".to_owned(),
            "b".to_owned(),
            "mike".to_owned(),
        ];
        assert_eq!(ordered_units(units, &order), vec!["b", "a", "mike", "Zulu"]);
    }
}
