// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `IndexEntry`: one row of the directory-level `index.json` summary.

use crate::report::{ClientInfo, Report, RunStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sync-outcome summary projected into an index entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexSyncSummary {
    pub status: Option<RunStatus>,
    /// `end - start`, in seconds; absent while a report has no `end`.
    pub duration: Option<i64>,
    pub block: u64,
    pub slot: u64,
}

/// One row of `index.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub run_id: String,
    pub timestamp: i64,
    pub network: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    pub execution_client_info: ClientInfo,
    pub consensus_client_info: ClientInfo,
    pub sync_summary: IndexSyncSummary,
    pub main_file: String,
    pub progress_file: Option<String>,
}

impl IndexEntry {
    /// Project a parsed main-report file into an index row.
    ///
    /// `main_file` is the filename (not full path) as it should appear in the
    /// index, matching how the report was named on disk.
    pub fn from_report(report: &Report, main_file: impl Into<String>) -> Self {
        let duration = report
            .sync_status
            .end
            .map(|end| end - report.sync_status.start);
        Self {
            run_id: report.run_id.clone(),
            timestamp: report.timestamp,
            network: report.network.clone(),
            labels: report.labels.clone(),
            execution_client_info: report.execution_client_info.clone(),
            consensus_client_info: report.consensus_client_info.clone(),
            sync_summary: IndexSyncSummary {
                status: report.sync_status.status,
                duration,
                block: report.sync_status.block,
                slot: report.sync_status.slot,
            },
            main_file: main_file.into(),
            progress_file: report.sync_status.sync_progress_file.clone(),
        }
    }
}

/// Top-level `index.json` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Index {
    pub generated: i64,
    pub entries: Vec<IndexEntry>,
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
