// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Report` data model: an append-only record of a single sync run.

use crate::ids::RunId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Terminal status of a finished (or finishing) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Timeout,
    Cancelled,
    Error,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Success => write!(f, "success"),
            RunStatus::Timeout => write!(f, "timeout"),
            RunStatus::Cancelled => write!(f, "cancelled"),
            RunStatus::Error => write!(f, "error"),
        }
    }
}

/// A single time-series sample: block/slot height, disk usage, and peer counts
/// for both layers at one poll tick.
///
/// Stored separately from the main report (`*.progress.json`) to keep the main
/// report file small; `t` is monotonically increasing within one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressEntry {
    /// Unix timestamp (seconds) of this sample.
    pub t: i64,
    /// Execution-layer block height.
    pub b: u64,
    /// Consensus-layer slot height.
    pub s: u64,
    /// Execution-layer disk usage in bytes.
    pub de: u64,
    /// Consensus-layer disk usage in bytes.
    pub dc: u64,
    /// Execution-layer peer count.
    pub pe: u32,
    /// Consensus-layer peer count.
    pub pc: u32,
}

/// Image/entrypoint/version details about one of the two clients, captured at
/// Start by inspecting the provisioned (or adopted) service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub client_type: String,
    pub image: String,
    #[serde(default)]
    pub entrypoint: Vec<String>,
    #[serde(default)]
    pub cmd: Vec<String>,
    pub version: Option<String>,
    #[serde(default)]
    pub env_vars: HashMap<String, String>,
}

/// Host details captured once at Start, for reproducibility of benchmark results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub hostname: String,
    pub os: String,
    pub cpu: String,
    pub memory: String,
    pub hypervisor: String,
    pub timezone: String,
}

/// The sync-progress section of the report: start/end markers, terminal status,
/// final block/slot, and a pointer to the companion progress file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub start: i64,
    pub end: Option<i64>,
    pub status: Option<RunStatus>,
    pub status_message: Option<String>,
    pub block: u64,
    pub slot: u64,
    pub sync_progress_file: Option<String>,
    pub last_entry: Option<ProgressEntry>,
    pub entries_count: usize,
}

impl SyncStatus {
    pub fn new(start_unix: i64) -> Self {
        Self {
            start: start_unix,
            ..Default::default()
        }
    }

    pub fn is_closed(&self) -> bool {
        self.status.is_some()
    }
}

/// Append-only record of one sync run.
///
/// Callers mutate it only through the setters below; `progress` is cleared by
/// [`crate::report::Report::take_progress_for_finalize`] when the report is
/// split to disk (see the report-service crate), leaving `last_entry` and
/// `entries_count` as the durable summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    pub run_id: String,
    pub timestamp: i64,
    pub network: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    pub sync_status: SyncStatus,
    pub execution_client_info: ClientInfo,
    pub consensus_client_info: ClientInfo,
    pub system_info: SystemInfo,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub progress: Vec<ProgressEntry>,
}

impl Report {
    pub fn new(run_id: &RunId, network: impl Into<String>, timestamp: i64) -> Self {
        Self {
            run_id: run_id.as_str().to_string(),
            timestamp,
            network: network.into(),
            sync_status: SyncStatus::new(timestamp),
            ..Default::default()
        }
    }

    /// Append a sample; updates the running `entries_count`.
    ///
    /// Callers are responsible for only calling this with monotonically
    /// increasing `t` (the orchestrator poll loop guarantees this since it is
    /// called once per tick).
    pub fn add_sync_progress_entry(&mut self, entry: ProgressEntry) {
        self.progress.push(entry);
        self.sync_status.entries_count = self.progress.len();
    }

    /// Mark the run closed with a terminal status, recording the final block/slot
    /// from the last recorded sample (if any).
    pub fn close(&mut self, end_unix: i64, status: RunStatus, message: impl Into<String>) {
        self.sync_status.end = Some(end_unix);
        self.sync_status.status = Some(status);
        self.sync_status.status_message = Some(message.into());
        if let Some(last) = self.progress.last() {
            self.sync_status.block = last.b;
            self.sync_status.slot = last.s;
        }
    }

    /// Take a shallow clone suitable for finalization: progress is emptied
    /// and `last_entry`/`sync_progress_file` are set by the caller before
    /// writing the main file.
    pub fn clone_for_finalize(&self) -> Report {
        let mut clone = self.clone();
        clone.sync_status.last_entry = self.progress.last().copied();
        clone.progress.clear();
        clone
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
