// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `TestData`: the coordinator-side mirror of a remote run.
//!
//! This module holds the pure state-transition logic (construction, applying a
//! keepalive/progress/complete, orphaning) so it can be unit tested without any
//! locking or I/O. The coordinator crate wraps a `HashMap<RunId, TestData>`
//! behind a lock and calls these methods from its writer operations.

use crate::ids::RunId;
use crate::report::{ClientInfo, ProgressEntry, SystemInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

/// Errors produced applying a writer operation to a `TestData` record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TestDataError {
    #[error("test already exists")]
    AlreadyExists,
    #[error("test not found")]
    NotFound,
    #[error("test is already complete")]
    AlreadyComplete,
}

/// Payload carried by a keepalive (both the initial create and later refreshes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keepalive {
    pub run_id: RunId,
    pub network: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    pub enclave_name: String,
    pub execution_client_info: ClientInfo,
    pub consensus_client_info: ClientInfo,
    pub system_info: Option<SystemInfo>,
}

/// Payload carried by a completion request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompleteRequest {
    pub error: Option<String>,
}

/// Coordinator-side mirror of one remote run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestData {
    pub run_id: RunId,
    pub network: String,
    pub labels: HashMap<String, String>,
    pub start_time: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_running: bool,
    pub is_complete: bool,
    pub error: Option<String>,
    pub execution_client_info: ClientInfo,
    pub consensus_client_info: ClientInfo,
    pub enclave_name: String,
    pub system_info: Option<SystemInfo>,
    pub current_metrics: Option<ProgressEntry>,
    pub history: VecDeque<ProgressEntry>,
    /// Cap on `history.len()`; oldest entries are trimmed first.
    pub max_history: usize,
}

impl TestData {
    pub fn from_keepalive(keepalive: Keepalive, now: DateTime<Utc>, max_history: usize) -> Self {
        Self {
            run_id: keepalive.run_id,
            network: keepalive.network,
            labels: keepalive.labels,
            start_time: now,
            last_update: now,
            end_time: None,
            is_running: true,
            is_complete: false,
            error: None,
            execution_client_info: keepalive.execution_client_info,
            consensus_client_info: keepalive.consensus_client_info,
            enclave_name: keepalive.enclave_name,
            system_info: keepalive.system_info,
            current_metrics: None,
            history: VecDeque::new(),
            max_history,
        }
    }

    /// Refresh `last_update`. Fails if the test has already completed.
    pub fn apply_keepalive(&mut self, now: DateTime<Utc>) -> Result<(), TestDataError> {
        if self.is_complete {
            return Err(TestDataError::AlreadyComplete);
        }
        self.last_update = now;
        self.is_running = true;
        Ok(())
    }

    /// Append a progress sample, trimming the oldest entry if over cap.
    /// Fails if the test has already completed.
    pub fn apply_progress(
        &mut self,
        entry: ProgressEntry,
        now: DateTime<Utc>,
    ) -> Result<(), TestDataError> {
        if self.is_complete {
            return Err(TestDataError::AlreadyComplete);
        }
        self.last_update = now;
        self.current_metrics = Some(entry);
        self.history.push_back(entry);
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }
        Ok(())
    }

    /// Mark the test terminal. Fails if already complete.
    pub fn apply_complete(
        &mut self,
        complete: CompleteRequest,
        now: DateTime<Utc>,
    ) -> Result<(), TestDataError> {
        if self.is_complete {
            return Err(TestDataError::AlreadyComplete);
        }
        self.is_running = false;
        self.is_complete = true;
        self.end_time = Some(now);
        self.last_update = now;
        self.error = complete.error;
        Ok(())
    }

    /// Mark the test orphaned: no longer running, with a fixed error message.
    /// A no-op if the test is not currently running (already orphaned or complete).
    pub fn mark_orphaned(&mut self) {
        if !self.is_running {
            return;
        }
        self.is_running = false;
        self.error = Some("orphaned".to_string());
    }

    pub fn is_stale(&self, now: DateTime<Utc>, threshold: chrono::Duration) -> bool {
        now - self.last_update > threshold
    }
}

#[cfg(test)]
#[path = "test_data_tests.rs"]
mod tests;
