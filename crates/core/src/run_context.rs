// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `RunContext`: the authoritative per-run configuration object.

use crate::ids::RunId;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a single sync-benchmark run.
///
/// Created once at Start; `run_id` and `enclave_name` are immutable afterwards.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: RunId,
    pub network: String,
    pub el_type: String,
    pub cl_type: String,
    pub el_image: Option<String>,
    pub cl_image: Option<String>,
    pub el_extra_args: Vec<String>,
    pub cl_extra_args: Vec<String>,
    pub el_env: HashMap<String, String>,
    pub cl_env: HashMap<String, String>,
    pub enclave_name: String,
    pub labels: HashMap<String, String>,
    pub run_timeout: Option<Duration>,
    pub report_dir: PathBuf,
    pub check_interval: Duration,
}

/// Builder-style configuration accepted by [`RunContext::new`]; kept separate
/// from `RunContext` itself so callers don't have to pre-compute `enclave_name`.
#[derive(Debug, Clone)]
pub struct RunContextConfig {
    pub run_id: RunId,
    pub network: String,
    pub el_type: String,
    pub cl_type: String,
    pub el_image: Option<String>,
    pub cl_image: Option<String>,
    pub el_extra_args: Vec<String>,
    pub cl_extra_args: Vec<String>,
    pub el_env: HashMap<String, String>,
    pub cl_env: HashMap<String, String>,
    pub labels: HashMap<String, String>,
    pub run_timeout: Option<Duration>,
    pub report_dir: PathBuf,
    pub check_interval: Duration,
}

/// Derive the enclave name for a `(network, el, cl)` triple: `sync-test-<network>-<el>-<cl>`.
pub fn enclave_name(network: &str, el_type: &str, cl_type: &str) -> String {
    format!("sync-test-{network}-{el_type}-{cl_type}")
}

/// Derive the deterministic metrics-exporter service name for a client pair.
pub fn metrics_exporter_service_name(cl_type: &str, el_type: &str) -> String {
    format!("ethereum-metrics-exporter-1-{cl_type}-{el_type}")
}

/// Derive the base filename stem shared by the main/progress/index files:
/// `<network>_<el>_<cl>`.
pub fn report_base(network: &str, el_type: &str, cl_type: &str) -> String {
    format!("{network}_{el_type}_{cl_type}")
}

impl RunContext {
    pub fn new(config: RunContextConfig) -> Self {
        let enclave_name = enclave_name(&config.network, &config.el_type, &config.cl_type);
        Self {
            run_id: config.run_id,
            network: config.network,
            el_type: config.el_type,
            cl_type: config.cl_type,
            el_image: config.el_image,
            cl_image: config.cl_image,
            el_extra_args: config.el_extra_args,
            cl_extra_args: config.cl_extra_args,
            el_env: config.el_env,
            cl_env: config.cl_env,
            enclave_name,
            labels: config.labels,
            run_timeout: config.run_timeout,
            report_dir: config.report_dir,
            check_interval: config.check_interval,
        }
    }

    pub fn metrics_exporter_service(&self) -> String {
        metrics_exporter_service_name(&self.cl_type, &self.el_type)
    }

    pub fn report_base(&self) -> String {
        report_base(&self.network, &self.el_type, &self.cl_type)
    }
}

#[cfg(test)]
#[path = "run_context_tests.rs"]
mod tests;
