//! Dropbox-style HTTP store.
//!
//! Two endpoints: the API base for metadata and sharing calls (JSON
//! body), the content base for uploads (octet-stream body with a
//! `Dropbox-API-Arg` JSON header). Files up to the chunk size go up in
//! one request; larger files use an upload session with fixed-size
//! appends. All uploads run in overwrite mode.

use super::{RemoteMetadata, RemoteStore, StoreError};
use crate::config::RemoteConfig;
use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::{
    StatusCode,
    blocking::{Client, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::{
    fs::File,
    io::Read,
    path::Path,
};

/// Session appends must be a multiple of this; files at or below it
/// take the single-request path.
pub const CHUNK_SIZE: usize = 8 * 1024 * 1024;

pub struct DropboxStore {
    client: Client,
    api_base: String,
    content_base: String,
    token: String,
}

#[derive(Deserialize)]
struct FileMetadata {
    client_modified: String,
}

#[derive(Deserialize)]
struct SessionStart {
    session_id: String,
}

#[derive(Deserialize)]
struct SharedLink {
    url: String,
}

#[derive(Deserialize)]
struct SharedLinkList {
    links: Vec<SharedLink>,
}

impl DropboxStore {
    pub fn new(config: &RemoteConfig, token: String) -> Self {
        Self {
            client: Client::new(),
            api_base: config.api_base.clone(),
            content_base: config.content_base.clone(),
            token,
        }
    }

    fn api_call(&self, endpoint: &str, body: serde_json::Value) -> Result<Response, StoreError> {
        let response = self
            .client
            .post(format!("{}/{endpoint}", self.api_base))
            .bearer_auth(&self.token)
            .json(&body)
            .send()?;
        Ok(response)
    }

    /// Content-endpoint call: arguments in the `Dropbox-API-Arg`
    /// header, raw bytes in the body.
    fn content_call(
        &self,
        endpoint: &str,
        arg: serde_json::Value,
        bytes: Vec<u8>,
    ) -> Result<Response, StoreError> {
        let response = self
            .client
            .post(format!("{}/{endpoint}", self.content_base))
            .bearer_auth(&self.token)
            .header("Dropbox-API-Arg", arg.to_string())
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()?;
        Ok(response)
    }

    /// Map the HTTP status onto the error taxonomy; returns the body
    /// text of a successful response.
    fn check(response: Response) -> Result<String, StoreError> {
        let status = response.status();
        let body = response.text()?;
        match status {
            _ if status.is_success() => Ok(body),
            StatusCode::UNAUTHORIZED => Err(StoreError::Auth(body)),
            _ => Err(StoreError::Api(format!("{status}: {body}"))),
        }
    }

    fn upload_single(&self, bytes: Vec<u8>, remote_path: &str) -> Result<(), StoreError> {
        let arg = json!({ "path": remote_path, "mode": "overwrite", "mute": true });
        Self::check(self.content_call("files/upload", arg, bytes)?)?;
        Ok(())
    }

    fn upload_session(&self, file: &mut File, remote_path: &str) -> Result<(), StoreError> {
        let mut chunk = vec![0u8; CHUNK_SIZE];

        let read = read_chunk(file, &mut chunk)?;
        let body = Self::check(self.content_call(
            "files/upload_session/start",
            json!({ "close": false }),
            chunk[..read].to_vec(),
        )?)?;
        let session: SessionStart = parse(&body)?;
        let mut offset = read;

        loop {
            let read = read_chunk(file, &mut chunk)?;
            let cursor = json!({ "session_id": session.session_id, "offset": offset });

            if read < CHUNK_SIZE {
                // final (possibly empty) chunk closes the session
                let arg = json!({
                    "cursor": cursor,
                    "commit": { "path": remote_path, "mode": "overwrite", "mute": true },
                });
                Self::check(self.content_call(
                    "files/upload_session/finish",
                    arg,
                    chunk[..read].to_vec(),
                )?)?;
                return Ok(());
            }

            Self::check(self.content_call(
                "files/upload_session/append_v2",
                json!({ "cursor": cursor, "close": false }),
                chunk[..read].to_vec(),
            )?)?;
            offset += read;
        }
    }
}

impl RemoteStore for DropboxStore {
    fn metadata(&self, remote_path: &str) -> Result<Option<RemoteMetadata>, StoreError> {
        let response = self.api_call("files/get_metadata", json!({ "path": remote_path }))?;

        if response.status() == StatusCode::CONFLICT {
            // path lookup errors come back as 409 with a summary
            let body = response.text()?;
            if body.contains("not_found") {
                return Ok(None);
            }
            return Err(StoreError::Api(body));
        }

        let body = Self::check(response)?;
        let metadata: FileMetadata = parse(&body)?;
        let modified = DateTime::parse_from_rfc3339(&metadata.client_modified)
            .map_err(|e| StoreError::Api(format!("Bad client_modified timestamp: {e}")))?
            .with_timezone(&Utc);
        Ok(Some(RemoteMetadata { modified }))
    }

    fn upload(&self, local: &Path, remote_path: &str) -> Result<(), StoreError> {
        let mut file = File::open(local)?;
        let size = file.metadata()?.len() as usize;

        if size <= CHUNK_SIZE {
            let mut bytes = Vec::with_capacity(size);
            file.read_to_end(&mut bytes)?;
            self.upload_single(bytes, remote_path)
        } else {
            self.upload_session(&mut file, remote_path)
        }
    }

    fn shared_link(&self, remote_path: &str) -> Result<String, StoreError> {
        let response = self.api_call(
            "sharing/create_shared_link_with_settings",
            json!({ "path": remote_path }),
        )?;

        if response.status() == StatusCode::CONFLICT {
            let body = response.text()?;
            if body.contains("shared_link_already_exists") {
                // reuse the existing link instead of failing
                let body = Self::check(self.api_call(
                    "sharing/list_shared_links",
                    json!({ "path": remote_path, "direct_only": true }),
                )?)?;
                let list: SharedLinkList = parse(&body)?;
                return list
                    .links
                    .into_iter()
                    .next()
                    .map(|l| l.url)
                    .ok_or_else(|| StoreError::Api("No existing shared link found".into()));
            }
            return Err(StoreError::Api(body));
        }

        let body = Self::check(response)?;
        let link: SharedLink = parse(&body)?;
        Ok(link.url)
    }
}

fn parse<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, StoreError> {
    serde_json::from_str(body).map_err(|e| StoreError::Api(format!("Bad response body: {e}")))
}

/// Fill `buf` as far as the file allows; short only at end of file.
fn read_chunk(file: &mut File, buf: &mut [u8]) -> Result<usize, StoreError> {
    let mut filled = 0;
    while filled < buf.len() {
        let read = file.read(&mut buf[filled..])?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    Ok(filled)
}
