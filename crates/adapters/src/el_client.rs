// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ElClient`: execution-layer JSON-RPC probe (`eth_syncing`, `eth_blockNumber`,
//! `net_peerCount`).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ElClientError {
    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned malformed JSON-RPC response: {message}")]
    MalformedResponse { endpoint: String, message: String },
    #[error("{endpoint} returned a JSON-RPC error: {code} {message}")]
    RpcError {
        endpoint: String,
        code: i64,
        message: String,
    },
}

/// Parsed `eth_syncing` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElSyncState {
    NotSyncing,
    Syncing {
        current_block: u64,
        highest_block: u64,
    },
}

#[async_trait]
pub trait ElClient: Send + Sync {
    async fn syncing(&self) -> Result<ElSyncState, ElClientError>;
    async fn block_number(&self) -> Result<u64, ElClientError>;
    async fn peer_count(&self) -> Result<u32, ElClientError>;
}

/// Minimal JSON-RPC envelope shared by every call this client makes.
#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Real `ElClient` backed by a shared [`reqwest::Client`], talking to a
/// single execution-layer JSON-RPC endpoint.
pub struct HttpElClient {
    client: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl HttpElClient {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_default_client(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self::new(client, endpoint)
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, ElClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|source| ElClientError::Request {
                endpoint: self.endpoint.clone(),
                source,
            })?;
        let parsed: RpcResponse =
            response
                .json()
                .await
                .map_err(|source| ElClientError::Request {
                    endpoint: self.endpoint.clone(),
                    source,
                })?;
        if let Some(error) = parsed.error {
            return Err(ElClientError::RpcError {
                endpoint: self.endpoint.clone(),
                code: error.code,
                message: error.message,
            });
        }
        parsed.result.ok_or_else(|| ElClientError::MalformedResponse {
            endpoint: self.endpoint.clone(),
            message: "missing both result and error".to_string(),
        })
    }

    fn parse_hex_u64(value: &Value, endpoint: &str) -> Result<u64, ElClientError> {
        let text = value.as_str().ok_or_else(|| ElClientError::MalformedResponse {
            endpoint: endpoint.to_string(),
            message: format!("expected hex string, got {value}"),
        })?;
        u64::from_str_radix(text.trim_start_matches("0x"), 16).map_err(|e| {
            ElClientError::MalformedResponse {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            }
        })
    }
}

#[async_trait]
impl ElClient for HttpElClient {
    async fn syncing(&self) -> Result<ElSyncState, ElClientError> {
        let result = self.call("eth_syncing", json!([])).await?;
        if result == Value::Bool(false) {
            return Ok(ElSyncState::NotSyncing);
        }
        let current_block = result
            .get("currentBlock")
            .ok_or_else(|| ElClientError::MalformedResponse {
                endpoint: self.endpoint.clone(),
                message: "missing currentBlock".to_string(),
            })
            .and_then(|v| Self::parse_hex_u64(v, &self.endpoint))?;
        let highest_block = result
            .get("highestBlock")
            .ok_or_else(|| ElClientError::MalformedResponse {
                endpoint: self.endpoint.clone(),
                message: "missing highestBlock".to_string(),
            })
            .and_then(|v| Self::parse_hex_u64(v, &self.endpoint))?;
        Ok(ElSyncState::Syncing {
            current_block,
            highest_block,
        })
    }

    async fn block_number(&self) -> Result<u64, ElClientError> {
        let result = self.call("eth_blockNumber", json!([])).await?;
        Self::parse_hex_u64(&result, &self.endpoint)
    }

    async fn peer_count(&self) -> Result<u32, ElClientError> {
        let result = self.call("net_peerCount", json!([])).await?;
        Self::parse_hex_u64(&result, &self.endpoint).map(|v| v as u32)
    }
}

#[cfg(any(test, feature = "test-support"))]
pub struct FakeElClient {
    pub syncing: parking_lot::Mutex<ElSyncState>,
    pub block_number: std::sync::atomic::AtomicU64,
    pub peer_count: std::sync::atomic::AtomicU32,
}

#[cfg(any(test, feature = "test-support"))]
impl Default for FakeElClient {
    fn default() -> Self {
        Self {
            syncing: parking_lot::Mutex::new(ElSyncState::NotSyncing),
            block_number: std::sync::atomic::AtomicU64::new(0),
            peer_count: std::sync::atomic::AtomicU32::new(0),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl FakeElClient {
    pub fn set_syncing(&self, state: ElSyncState) {
        *self.syncing.lock() = state;
    }

    pub fn set_block_number(&self, value: u64) {
        self.block_number.store(value, Ordering::Relaxed);
    }

    pub fn set_peer_count(&self, value: u32) {
        self.peer_count.store(value, Ordering::Relaxed);
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl ElClient for FakeElClient {
    async fn syncing(&self) -> Result<ElSyncState, ElClientError> {
        Ok(*self.syncing.lock())
    }

    async fn block_number(&self) -> Result<u64, ElClientError> {
        Ok(self.block_number.load(Ordering::Relaxed))
    }

    async fn peer_count(&self) -> Result<u32, ElClientError> {
        Ok(self.peer_count.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
#[path = "el_client_tests.rs"]
mod tests;
