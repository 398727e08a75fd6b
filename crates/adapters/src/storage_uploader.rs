// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ObjectStorage`: uploads a finished report (and its progress sidecar) to a
//! remote bucket for long-term retention, independent of the local on-disk
//! copy the report crate maintains.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("upload of {key} failed: {source}")]
    Upload {
        key: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("upload of {key} returned status {status}")]
    UnexpectedStatus { key: String, status: u16 },
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload the file at `local_path` under `remote_key`, returning the URL
    /// it is now reachable at.
    async fn upload(&self, local_path: &Path, remote_key: &str) -> Result<String, StorageError>;
}

/// Real `ObjectStorage` backed by a presigned-PUT-style HTTP bucket: a shared
/// [`reqwest::Client`] issues a `PUT` of the file body to `base_url/key`.
pub struct HttpObjectStorage {
    client: reqwest::Client,
    base_url: String,
}

impl HttpObjectStorage {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn upload(&self, local_path: &Path, remote_key: &str) -> Result<String, StorageError> {
        let body = fs::read(local_path)
            .await
            .map_err(|source| StorageError::Read {
                path: local_path.display().to_string(),
                source,
            })?;
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), remote_key);
        let response = self
            .client
            .put(&url)
            .body(body)
            .send()
            .await
            .map_err(|source| StorageError::Upload {
                key: remote_key.to_string(),
                source,
            })?;
        if !response.status().is_success() {
            return Err(StorageError::UnexpectedStatus {
                key: remote_key.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(url)
    }
}

#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
pub struct FakeObjectStorage {
    pub uploaded: parking_lot::Mutex<Vec<(String, Vec<u8>)>>,
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl ObjectStorage for FakeObjectStorage {
    async fn upload(&self, local_path: &Path, remote_key: &str) -> Result<String, StorageError> {
        let body = fs::read(local_path)
            .await
            .map_err(|source| StorageError::Read {
                path: local_path.display().to_string(),
                source,
            })?;
        self.uploaded
            .lock()
            .push((remote_key.to_string(), body));
        Ok(format!("fake://{remote_key}"))
    }
}

#[cfg(test)]
#[path = "storage_uploader_tests.rs"]
mod tests;
