//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

// ============================================================================
// [paths] Section Defaults
// ============================================================================

pub mod paths {
    use std::path::PathBuf;

    pub fn source() -> PathBuf {
        "source".into()
    }

    pub fn markdown() -> PathBuf {
        "markdown".into()
    }

    pub fn html() -> PathBuf {
        "html".into()
    }

    pub fn pdf() -> PathBuf {
        "pdf".into()
    }

    pub fn data() -> PathBuf {
        "data_to_share".into()
    }

    pub fn links() -> PathBuf {
        "data_to_share_links".into()
    }

    pub fn logs() -> PathBuf {
        "logs".into()
    }

    pub fn build_includes() -> PathBuf {
        "build_includes".into()
    }
}

// ============================================================================
// [render] Section Defaults
// ============================================================================

pub mod render {
    use std::path::PathBuf;

    pub fn command() -> Vec<String> {
        vec!["pandoc".into()]
    }

    pub fn css() -> Option<PathBuf> {
        None
    }
}

// ============================================================================
// [remote] Section Defaults
// ============================================================================

pub mod remote {
    pub fn credential_env() -> String {
        "DOCPRESS_REMOTE_TOKEN".into()
    }

    pub fn api_base() -> String {
        "https://api.dropboxapi.com/2".into()
    }

    pub fn content_base() -> String {
        "https://content.dropboxapi.com/2".into()
    }
}

// ============================================================================
// [validate] Section Defaults
// ============================================================================

pub mod validate {
    pub fn spellcheck_command() -> Vec<String> {
        vec!["spellchecker".into(), "--no-suggestions".into()]
    }

    pub fn link_check_command() -> Vec<String> {
        vec!["markdown-link-check".into()]
    }

    pub fn lint_command() -> Vec<String> {
        vec!["mdl".into()]
    }
}
