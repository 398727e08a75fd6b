// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the sync orchestrator.

use syncoor_adapters::{ContainerError, EnclaveError};
use syncoor_report::ReportError;
use syncoor_reportclient::ReportClientError;
use thiserror::Error;

use crate::recovery::RecoveryError;

/// Terminal or propagated errors from a single `SyncOrchestrator` run.
///
/// Transient per-call failures (a single EL/CL/metrics probe failing) are
/// logged and tolerated inside the poll loop; they never reach this type.
/// Only conditions that end the run surface here.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Enclave(#[from] EnclaveError),
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error(transparent)]
    Recovery(#[from] RecoveryError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error(transparent)]
    ReportClient(#[from] ReportClientError),
    #[error("run timed out after {elapsed_secs}s")]
    Timeout { elapsed_secs: u64 },
    #[error("{service} ({service_type}) is not running (exit code {exit_code:?} at {timestamp})")]
    ContainerCrashed {
        service: String,
        service_type: String,
        exit_code: Option<i32>,
        timestamp: i64,
    },
    #[error("run was cancelled")]
    Cancelled,
}
