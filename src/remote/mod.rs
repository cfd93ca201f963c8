//! Uploading data archives to remote object storage.
//!
//! Archives sync to `/<project_id>/<project_name>/<unit>.tar.gz`. An
//! archive is uploaded when the remote copy is absent, when the local
//! file is strictly newer than the remote `client_modified`, or when
//! the run is forced. After a successful upload the shareable link is
//! fetched and the unit's link record rewritten if the URL changed.
//!
//! The store is behind a trait so orchestration logic tests against an
//! in-memory mock instead of the network.

pub mod dropbox;

use crate::{
    config::ProjectConfig,
    links, log,
    utils::fs::visible_entries,
};
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use dropbox::DropboxStore;
use std::{
    env,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Remote side of an archive sync.
pub trait RemoteStore {
    /// Metadata of a remote file, or `None` when it does not exist.
    fn metadata(&self, remote_path: &str) -> Result<Option<RemoteMetadata>, StoreError>;

    /// Upload a local file, replacing any remote content.
    fn upload(&self, local: &Path, remote_path: &str) -> Result<(), StoreError>;

    /// Shareable URL for a remote file, creating the link on first use.
    fn shared_link(&self, remote_path: &str) -> Result<String, StoreError>;
}

/// What the skip rule needs to know about a remote file.
#[derive(Debug, Clone)]
pub struct RemoteMetadata {
    /// Remote `client_modified` timestamp.
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// Credential missing or rejected. Recoverable once by re-prompting.
    #[error("Authentication rejected: {0}")]
    Auth(String),
    /// Any other remote-side refusal. Skips the file, not the run.
    #[error("Remote API error: {0}")]
    Api(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

// ============================================================================
// Orchestration
// ============================================================================

/// Sync every local archive to the remote store.
///
/// Auth errors get one interactive retry with a fresh credential; a
/// second rejection is fatal. Other per-file errors are logged and the
/// remaining archives still sync.
pub fn upload_archives(config: &ProjectConfig, force: bool) -> Result<()> {
    let token = credential(config)?;
    let store = DropboxStore::new(&config.remote, token);

    match sync_archives(config, &store, force) {
        Err(error) if is_auth(&error) => {
            log!("error"; "{error}");
            let token = prompt_credential(config)?;
            let store = DropboxStore::new(&config.remote, token);
            sync_archives(config, &store, force)
        }
        result => result,
    }
}

/// One pass over the local archives against a store.
///
/// Returns `Err` for auth failures (so the caller can re-prompt) and
/// for the end-of-run summary when any file failed.
pub fn sync_archives(
    config: &ProjectConfig,
    store: &dyn RemoteStore,
    force: bool,
) -> Result<()> {
    let mut failures = 0usize;

    for archive in local_archives(config)? {
        let unit = archive_unit(&archive)?;
        match sync_one(config, store, force, &archive, &unit) {
            Ok(()) => {}
            Err(error) if is_auth(&error) => return Err(error),
            Err(error) => {
                log!("error"; "{unit}: {error:#}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{failures} archive upload(s) failed");
    }
    Ok(())
}

fn sync_one(
    config: &ProjectConfig,
    store: &dyn RemoteStore,
    force: bool,
    archive: &Path,
    unit: &str,
) -> Result<()> {
    let remote_path = format!("{}/{unit}.tar.gz", config.remote.remote_folder());

    if !force {
        if let Some(remote) = store.metadata(&remote_path)? {
            let local_modified: DateTime<Utc> = archive
                .metadata()
                .and_then(|m| m.modified())
                .with_context(|| format!("Failed to stat {}", archive.display()))?
                .into();
            if local_modified <= remote.modified {
                log!("upload"; "{unit}: already up to date");
                return Ok(());
            }
        }
    }

    log!("upload"; "{unit}: uploading {}", archive.display());
    store.upload(archive, &remote_path)?;

    let link = store.shared_link(&remote_path)?;
    if links::write_link_if_changed(config, unit, &link)? {
        log!("upload"; "{unit}: shareable link updated");
    }
    Ok(())
}

/// Every `<unit>.tar.gz` in the data output folder, sorted.
fn local_archives(config: &ProjectConfig) -> Result<Vec<PathBuf>> {
    let mut archives: Vec<PathBuf> = visible_entries(&config.paths.data)?
        .into_iter()
        .filter(|p| p.is_file())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".tar.gz"))
        })
        .collect();
    archives.sort();
    Ok(archives)
}

/// Unit name from an archive path (`intro.tar.gz` → `intro`).
fn archive_unit(archive: &Path) -> Result<String> {
    archive
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_suffix(".tar.gz"))
        .map(str::to_owned)
        .with_context(|| format!("Invalid archive name: {}", archive.display()))
}

fn is_auth(error: &anyhow::Error) -> bool {
    matches!(error.downcast_ref::<StoreError>(), Some(StoreError::Auth(_)))
}

// ============================================================================
// Credentials
// ============================================================================

/// Resolve the access token, preferring the configured env var.
fn credential(config: &ProjectConfig) -> Result<String> {
    match env::var(&config.remote.credential_env) {
        Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_owned()),
        _ => prompt_credential(config),
    }
}

/// Ask for a token on the terminal.
fn prompt_credential(config: &ProjectConfig) -> Result<String> {
    let mut stderr = io::stderr();
    write!(
        stderr,
        "Access token ({} not set or rejected): ",
        config.remote.credential_env
    )?;
    stderr.flush()?;

    let mut token = String::new();
    io::stdin()
        .lock()
        .read_line(&mut token)
        .context("Failed to read access token")?;
    let token = token.trim();
    if token.is_empty() {
        bail!("No access token provided");
    }
    Ok(token.to_owned())
}

// ============================================================================
// Tests
// ============================================================================
