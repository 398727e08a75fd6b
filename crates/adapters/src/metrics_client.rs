// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `MetricsClient`: scrapes the per-run metrics-exporter sidecar. It is the
//! authoritative merge of both layers — the orchestrator derives `b`/`s` and
//! disk/peer counts for each [`syncoor_core::ProgressEntry`] from this
//! record rather than from the EL/CL RPC clients directly.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsClientError {
    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned malformed body: {message}")]
    MalformedResponse { endpoint: String, message: String },
}

/// Execution-layer half of a [`MetricsRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecMetrics {
    pub sync_percentage: f64,
    pub current_block: u64,
    pub highest_block: u64,
    pub block_number: u64,
    pub peers: u32,
    pub disk_usage_bytes: u64,
    pub chain_id: u64,
}

/// Consensus-layer half of a [`MetricsRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsMetrics {
    pub sync_percentage: f64,
    pub head_slot: u64,
    pub highest_slot: u64,
    pub peers: u32,
    pub disk_usage_bytes: u64,
}

/// Decoded exporter record: `exec`/`cons` halves plus the version strings the
/// report's `ClientInfo.version` field is filled in from.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsRecord {
    pub exec: ExecMetrics,
    pub cons: ConsMetrics,
    #[serde(default)]
    pub exec_version: Option<String>,
    #[serde(default)]
    pub cons_version: Option<String>,
}

impl MetricsRecord {
    /// `b`: the maximum of the sync-progress current block and the node's
    /// own block-number view.
    pub fn block(&self) -> u64 {
        self.exec.current_block.max(self.exec.block_number)
    }

    /// `s`: CL head slot.
    pub fn slot(&self) -> u64 {
        self.cons.head_slot
    }
}

#[async_trait]
pub trait MetricsClient: Send + Sync {
    async fn fetch(&self) -> Result<MetricsRecord, MetricsClientError>;
}

/// Real `MetricsClient`: fetches the exporter's decoded JSON record.
pub struct HttpMetricsClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpMetricsClient {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn with_default_client(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self::new(client, endpoint)
    }
}

#[async_trait]
impl MetricsClient for HttpMetricsClient {
    async fn fetch(&self) -> Result<MetricsRecord, MetricsClientError> {
        let response =
            self.client
                .get(&self.endpoint)
                .send()
                .await
                .map_err(|source| MetricsClientError::Request {
                    endpoint: self.endpoint.clone(),
                    source,
                })?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| MetricsClientError::Request {
                endpoint: self.endpoint.clone(),
                source,
            })?;
        let mut record: MetricsRecord =
            serde_json::from_slice(&bytes).map_err(|e| MetricsClientError::MalformedResponse {
                endpoint: self.endpoint.clone(),
                message: e.to_string(),
            })?;
        record.exec.sync_percentage = syncoor_core::sanitize_f64(record.exec.sync_percentage);
        record.cons.sync_percentage = syncoor_core::sanitize_f64(record.cons.sync_percentage);
        Ok(record)
    }
}

#[cfg(any(test, feature = "test-support"))]
pub struct FakeMetricsClient {
    pub record: parking_lot::Mutex<MetricsRecord>,
}

#[cfg(any(test, feature = "test-support"))]
impl Default for FakeMetricsClient {
    fn default() -> Self {
        Self {
            record: parking_lot::Mutex::new(MetricsRecord::default()),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl FakeMetricsClient {
    pub fn set_record(&self, record: MetricsRecord) {
        *self.record.lock() = record;
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl MetricsClient for FakeMetricsClient {
    async fn fetch(&self) -> Result<MetricsRecord, MetricsClientError> {
        Ok(self.record.lock().clone())
    }
}

#[cfg(test)]
#[path = "metrics_client_tests.rs"]
mod tests;
