// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the reporting client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportClientError {
    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} rejected the request with status {status}: {body}")]
    Rejected {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("{endpoint} failed after exhausting retries: {status}")]
    RetriesExhausted { endpoint: String, status: u16 },
}
