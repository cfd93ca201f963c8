//! Source document validators.
//!
//! Runs the enabled external checkers (spellchecker, link checker,
//! lint) against a unit's source document and writes each tool's
//! output to a per-unit log file. Validator findings never fail a
//! build; they only surface in the logs and on the console.

use crate::{
    config::ProjectConfig,
    log,
    utils::tool::{self, to_args},
};
use anyhow::Result;
use std::fs;

/// Run every enabled validator against one unit's source document.
///
/// Each tool's combined output lands in `<logs>/<unit>/<name>.log`,
/// overwritten on every run so the log always reflects the latest
/// build. Findings are reported but not fatal.
pub fn validate_unit(config: &ProjectConfig, unit: &str) -> Result<()> {
    let document = config.unit_source(unit).join("document.md");
    if !document.is_file() {
        log!("validate"; "{unit}: no document.md, skipping validators");
        return Ok(());
    }

    let log_dir = config.paths.logs.join(unit);
    fs::create_dir_all(&log_dir)?;

    for (name, command) in config.validate.enabled() {
        let result = tool::run(None, command, &to_args([document.as_os_str()]))?;

        let log_file = log_dir.join(format!("{name}.log"));
        fs::write(&log_file, &result.output)?;

        if !result.succeeded {
            log!("validate"; "{unit}: {name} reported findings, see {}", log_file.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn config_with_validators(root: &Path, command: &[&str]) -> ProjectConfig {
        let mut config = ProjectConfig::default();
        config.set_root(root);
        config.paths.source = root.join("source");
        config.paths.logs = root.join("logs");
        config.validate.spellcheck = true;
        config.validate.link_check = false;
        config.validate.lint = false;
        config.validate.spellcheck_command = command.iter().map(|s| s.to_string()).collect();
        config
    }

    #[test]
    fn test_missing_document_is_not_an_error() {
        let dir = tempdir().unwrap();
        let config = config_with_validators(dir.path(), &["true"]);
        validate_unit(&config, "intro").unwrap();
        assert!(!config.paths.logs.join("intro").exists());
    }

    #[test]
    fn test_validator_output_lands_in_log_file() {
        let dir = tempdir().unwrap();
        let config = config_with_validators(dir.path(), &["echo", "two errors in"]);

        let unit_dir = config.unit_source("intro");
        fs::create_dir_all(&unit_dir).unwrap();
        fs::write(unit_dir.join("document.md"), "# Intro\n").unwrap();

        validate_unit(&config, "intro").unwrap();

        let log_file = config.paths.logs.join("intro/spellchecker.log");
        let content = fs::read_to_string(log_file).unwrap();
        assert!(content.contains("two errors in"));
        assert!(content.contains("document.md"));
    }

    #[test]
    fn test_failing_validator_does_not_fail_the_run() {
        let dir = tempdir().unwrap();
        let config = config_with_validators(dir.path(), &["false"]);

        let unit_dir = config.unit_source("intro");
        fs::create_dir_all(&unit_dir).unwrap();
        fs::write(unit_dir.join("document.md"), "# Intro\n").unwrap();

        validate_unit(&config, "intro").unwrap();
        assert!(config.paths.logs.join("intro/spellchecker.log").exists());
    }
}
