// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! syncoor-adapters: the capability traits through which the orchestrator,
//! recovery subsystem, and reporting client reach external systems — a
//! container runtime, an enclave engine, execution/consensus-layer nodes, a
//! metrics sidecar, and a report-upload bucket.
//!
//! Every trait here has a real implementation (subprocess- or reqwest-backed)
//! and a `Fake*` implementation gated behind `#[cfg(any(test, feature =
//! "test-support"))]`, so orchestrator- and coordinator-crate tests never
//! need a live enclave engine or network.

pub mod cl_client;
pub mod container;
pub mod el_client;
pub mod enclave;
pub mod metrics_client;
pub mod storage_uploader;
pub mod subprocess;

pub use cl_client::{ClClient, ClClientError, ClSyncState, HttpClClient};
pub use container::{CliContainerRuntime, ContainerError, ContainerRuntime, ContainerStatus, MountKind};
pub use el_client::{ElClient, ElClientError, ElSyncState, HttpElClient};
pub use enclave::{EnclaveError, EnclaveManager, KurtosisEnclaveManager, ServiceInfo};
pub use metrics_client::{
    ConsMetrics, ExecMetrics, HttpMetricsClient, MetricsClient, MetricsClientError, MetricsRecord,
};
pub use storage_uploader::{HttpObjectStorage, ObjectStorage, StorageError};

#[cfg(any(test, feature = "test-support"))]
pub use cl_client::FakeClClient;
#[cfg(any(test, feature = "test-support"))]
pub use container::FakeContainerRuntime;
#[cfg(any(test, feature = "test-support"))]
pub use el_client::FakeElClient;
#[cfg(any(test, feature = "test-support"))]
pub use enclave::FakeEnclaveManager;
#[cfg(any(test, feature = "test-support"))]
pub use metrics_client::FakeMetricsClient;
#[cfg(any(test, feature = "test-support"))]
pub use storage_uploader::FakeObjectStorage;
