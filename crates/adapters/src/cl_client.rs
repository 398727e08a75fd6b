// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ClClient`: consensus-layer Beacon API probe (`GET /eth/v1/node/syncing`).
//! Peer counts for the consensus layer come from the metrics exporter, not a
//! Beacon API call — the Beacon API has no `/eth/v1/node/peer_count` in this
//! system's external-interface surface.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClClientError {
    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned malformed body: {message}")]
    MalformedResponse { endpoint: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClSyncState {
    pub head_slot: u64,
    pub sync_distance: u64,
    pub is_syncing: bool,
    pub is_optimistic: bool,
}

#[async_trait]
pub trait ClClient: Send + Sync {
    async fn syncing(&self) -> Result<ClSyncState, ClClientError>;
}

#[derive(Debug, Deserialize)]
struct SyncingEnvelope {
    data: SyncingData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncingData {
    #[serde(deserialize_with = "deserialize_stringly_u64")]
    head_slot: u64,
    #[serde(deserialize_with = "deserialize_stringly_u64")]
    sync_distance: u64,
    is_syncing: bool,
    #[serde(default)]
    is_optimistic: bool,
}

fn deserialize_stringly_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

/// Real `ClClient` backed by a shared [`reqwest::Client`], talking to a
/// single consensus-layer Beacon API endpoint.
pub struct HttpClClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn with_default_client(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self::new(client, base_url)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl ClClient for HttpClClient {
    async fn syncing(&self) -> Result<ClSyncState, ClClientError> {
        let endpoint = self.url("/eth/v1/node/syncing");
        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|source| ClClientError::Request {
                endpoint: endpoint.clone(),
                source,
            })?;
        let parsed: SyncingEnvelope =
            response
                .json()
                .await
                .map_err(|source| ClClientError::Request {
                    endpoint: endpoint.clone(),
                    source,
                })?;
        Ok(ClSyncState {
            head_slot: parsed.data.head_slot,
            sync_distance: parsed.data.sync_distance,
            is_syncing: parsed.data.is_syncing,
            is_optimistic: parsed.data.is_optimistic,
        })
    }
}

#[cfg(any(test, feature = "test-support"))]
pub struct FakeClClient {
    pub syncing: parking_lot::Mutex<ClSyncState>,
}

#[cfg(any(test, feature = "test-support"))]
impl Default for FakeClClient {
    fn default() -> Self {
        Self {
            syncing: parking_lot::Mutex::new(ClSyncState::default()),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl FakeClClient {
    pub fn set_syncing(&self, state: ClSyncState) {
        *self.syncing.lock() = state;
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl ClClient for FakeClClient {
    async fn syncing(&self) -> Result<ClSyncState, ClClientError> {
        Ok(*self.syncing.lock())
    }
}

#[cfg(test)]
#[path = "cl_client_tests.rs"]
mod tests;
