// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for report persistence.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize report for run {run_id}: {source}")]
    Serialize {
        run_id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to parse report at {path}: {source}")]
    Deserialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("no temp report found for run {0}")]
    TempNotFound(String),
}
