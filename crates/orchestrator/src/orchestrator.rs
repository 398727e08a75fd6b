// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `SyncOrchestrator`: owns a single run from provisioning through report.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use syncoor_adapters::{ClClient, ContainerRuntime, ElClient, ElSyncState, EnclaveManager, MetricsClient};
use syncoor_core::{
    ClientInfo, CompleteRequest, Keepalive, ProgressEntry, Report, RunContext, RunStatus,
};
use syncoor_report::ReportStore;
use syncoor_reportclient::ReportingClient;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::OrchestratorError;
use crate::log_streamer::spawn_log_streamer;
use crate::recovery::{check_recoverable, validate_enclave};

/// Per-call deadline for each EL/CL/metrics probe inside one poll tick.
const POLL_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything the orchestrator needs to reach the outside world. Grouped into
/// one struct so `SyncOrchestrator::new` doesn't take a dozen positional
/// arguments.
pub struct OrchestratorDeps {
    pub enclave_mgr: Arc<dyn EnclaveManager>,
    pub container_runtime: Arc<dyn ContainerRuntime>,
    pub el_client: Arc<dyn ElClient>,
    pub cl_client: Arc<dyn ClClient>,
    pub metrics_client: Arc<dyn MetricsClient>,
    pub report_store: Arc<ReportStore>,
    pub reporting_client: Option<Arc<ReportingClient>>,
    pub clock: Arc<dyn syncoor_core::Clock>,
    pub recovery_enabled: bool,
}

pub struct SyncOrchestrator {
    ctx: RunContext,
    deps: OrchestratorDeps,
    report: Mutex<Report>,
    cancel: CancellationToken,
    background_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SyncOrchestrator {
    pub fn new(ctx: RunContext, deps: OrchestratorDeps) -> Self {
        let now = deps.clock.now().timestamp();
        let report = Report::new(&ctx.run_id, ctx.network.clone(), now);
        Self {
            ctx,
            deps,
            report: Mutex::new(report),
            cancel: CancellationToken::new(),
            background_tasks: Mutex::new(Vec::new()),
        }
    }

    /// Cancel the run's internal context. Does not tear down the enclave,
    /// which may persist for orphan/reuse.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    fn take_keepalive(&self, execution: ClientInfo, consensus: ClientInfo) -> Keepalive {
        Keepalive {
            run_id: self.ctx.run_id.clone(),
            network: self.ctx.network.clone(),
            labels: self.ctx.labels.clone(),
            enclave_name: self.ctx.enclave_name.clone(),
            execution_client_info: execution,
            consensus_client_info: consensus,
            system_info: None,
        }
    }

    /// Provision (or adopt) the enclave, resolve client info, and send the
    /// initial keepalive. Non-blocking: does not drive the poll loop.
    pub async fn start(&self) -> Result<(), OrchestratorError> {
        let recovered = if self.deps.recovery_enabled {
            check_recoverable(self.deps.enclave_mgr.as_ref(), &self.ctx).await?
        } else {
            None
        };

        let (el_info, cl_info) = if let Some(state) = recovered {
            tracing::info!(enclave = %state.enclave_name, "adopting existing enclave");
            let (el, cl, _metrics) =
                validate_enclave(self.deps.enclave_mgr.as_ref(), &state, &self.ctx).await?;
            if let Some(restored) = self
                .deps
                .report_store
                .restore_run_state(&self.ctx.report_base())
                .await?
            {
                let mut restored = restored;
                restored.sync_status.end = None;
                restored.sync_status.status = None;
                *self.report.lock() = restored;
            }
            (el, cl)
        } else {
            tracing::info!(enclave = %self.ctx.enclave_name, "provisioning a new enclave");
            self.deps.enclave_mgr.run(&self.ctx.enclave_name).await?;
            let el = self
                .deps
                .enclave_mgr
                .inspect_service(&self.ctx.enclave_name, &self.ctx.el_type)
                .await?;
            let cl = self
                .deps
                .enclave_mgr
                .inspect_service(&self.ctx.enclave_name, &self.ctx.cl_type)
                .await?;
            (el, cl)
        };

        let execution_client_info = ClientInfo {
            name: self.ctx.el_type.clone(),
            client_type: self.ctx.el_type.clone(),
            image: el_info.image,
            entrypoint: el_info.entrypoint,
            cmd: el_info.cmd,
            version: None,
            env_vars: self.ctx.el_env.clone(),
        };
        let consensus_client_info = ClientInfo {
            name: self.ctx.cl_type.clone(),
            client_type: self.ctx.cl_type.clone(),
            image: cl_info.image,
            entrypoint: cl_info.entrypoint,
            cmd: cl_info.cmd,
            version: None,
            env_vars: self.ctx.cl_env.clone(),
        };

        {
            let mut report = self.report.lock();
            report.execution_client_info = execution_client_info.clone();
            report.consensus_client_info = consensus_client_info.clone();
            report.labels = self.ctx.labels.clone();
        }

        if let Some(reporting_client) = &self.deps.reporting_client {
            let keepalive = self.take_keepalive(execution_client_info, consensus_client_info);
            reporting_client.report_keepalive(&keepalive).await?;
            let mut tasks = self.background_tasks.lock();
            tasks.push(reporting_client.spawn_keepalive_timer(keepalive));
            tasks.push(reporting_client.spawn_progress_worker(self.ctx.run_id.clone()));
        }

        let mut tasks = self.background_tasks.lock();
        tasks.push(spawn_log_streamer(
            Arc::clone(&self.deps.container_runtime),
            self.ctx.el_type.clone(),
            self.ctx.el_type.clone(),
            "execution".to_string(),
            self.cancel.clone(),
        ));
        tasks.push(spawn_log_streamer(
            Arc::clone(&self.deps.container_runtime),
            self.ctx.cl_type.clone(),
            self.ctx.cl_type.clone(),
            "consensus".to_string(),
            self.cancel.clone(),
        ));

        Ok(())
    }

    /// Drive the poll loop until the run completes, times out, crashes, or is
    /// cancelled. Finalizes the report to disk on every terminal path.
    pub async fn wait_for_sync(&self) -> Result<(), OrchestratorError> {
        let start = self.deps.clock.now();
        let mut interval = tokio::time::interval(self.ctx.check_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    return self.finalize_cancelled().await;
                }
                _ = interval.tick() => {
                    if let Some(run_timeout) = self.ctx.run_timeout {
                        let elapsed = self.deps.clock.now() - start;
                        if elapsed >= chrono::Duration::from_std(run_timeout).unwrap_or(chrono::Duration::zero()) {
                            return self.finalize_timeout(elapsed.num_seconds().max(0) as u64).await;
                        }
                    }

                    if let Some(crash) = self.detect_crash().await? {
                        self.finalize_error(&crash.to_string()).await?;
                        return Err(crash);
                    }

                    if let Some(done) = self.poll_tick().await? {
                        if done {
                            return self.finalize_success().await;
                        }
                    }
                }
            }
        }
    }

    async fn detect_crash(&self) -> Result<Option<OrchestratorError>, OrchestratorError> {
        for (service, service_type) in [
            (self.ctx.el_type.clone(), "execution"),
            (self.ctx.cl_type.clone(), "consensus"),
        ] {
            let status = match self.deps.container_runtime.inspect(&service).await {
                Ok(status) => status,
                Err(_) => continue,
            };
            if !status.running {
                return Ok(Some(OrchestratorError::ContainerCrashed {
                    service,
                    service_type: service_type.to_string(),
                    exit_code: status.exit_code,
                    timestamp: self.deps.clock.now().timestamp(),
                }));
            }
        }
        Ok(None)
    }

    /// Execute one poll tick. Returns `Ok(Some(true))` if the run has just
    /// reached the completion condition, `Ok(Some(false))`/`Ok(None)` otherwise.
    async fn poll_tick(&self) -> Result<Option<bool>, OrchestratorError> {
        let (el_syncing, el_peers, cl_syncing, metrics) = tokio::join!(
            call_with_timeout(self.deps.el_client.syncing()),
            call_with_timeout(self.deps.el_client.peer_count()),
            call_with_timeout(self.deps.cl_client.syncing()),
            call_with_timeout(self.deps.metrics_client.fetch()),
        );

        if let (Some(el_syncing), Some(el_peers), Some(cl_syncing), Some(metrics)) =
            (el_syncing, el_peers, cl_syncing, metrics)
        {
            let entry = ProgressEntry {
                t: self.deps.clock.now().timestamp(),
                b: metrics.block(),
                s: metrics.slot(),
                de: metrics.exec.disk_usage_bytes,
                dc: metrics.cons.disk_usage_bytes,
                pe: el_peers,
                pc: metrics.cons.peers,
            };

            {
                let mut report = self.report.lock();
                report.add_sync_progress_entry(entry);
            }
            self.deps
                .report_store
                .save_temp_report(&self.report.lock().clone(), &self.ctx.report_base())
                .await?;
            if let Some(reporting_client) = &self.deps.reporting_client {
                reporting_client.report_progress(entry);
            }

            let synced = matches!(el_syncing, ElSyncState::NotSyncing)
                && !cl_syncing.is_syncing
                && !cl_syncing.is_optimistic
                && entry.b > 0;
            return Ok(Some(synced));
        }
        Ok(None)
    }

    async fn finalize_success(&self) -> Result<(), OrchestratorError> {
        let end = self.deps.clock.now().timestamp();
        {
            let mut report = self.report.lock();
            report.close(end, RunStatus::Success, "sync complete");
        }
        self.persist_report().await?;
        if let Some(reporting_client) = &self.deps.reporting_client {
            reporting_client
                .report_complete(&self.ctx.run_id, CompleteRequest { error: None })
                .await?;
            reporting_client.shutdown();
        }
        self.stop_background_tasks();
        Ok(())
    }

    async fn finalize_timeout(&self, elapsed_secs: u64) -> Result<(), OrchestratorError> {
        let end = self.deps.clock.now().timestamp();
        {
            let mut report = self.report.lock();
            report.close(
                end,
                RunStatus::Timeout,
                format!("run timed out after {elapsed_secs}s"),
            );
        }
        self.persist_report().await?;
        if let Some(reporting_client) = &self.deps.reporting_client {
            let _ = reporting_client
                .report_complete(
                    &self.ctx.run_id,
                    CompleteRequest {
                        error: Some(format!("timed out after {elapsed_secs}s")),
                    },
                )
                .await;
            reporting_client.shutdown();
        }
        self.stop_background_tasks();
        Err(OrchestratorError::Timeout { elapsed_secs })
    }

    async fn finalize_error(&self, message: &str) -> Result<(), OrchestratorError> {
        let end = self.deps.clock.now().timestamp();
        {
            let mut report = self.report.lock();
            report.close(end, RunStatus::Error, message.to_string());
        }
        self.persist_report().await?;
        if let Some(reporting_client) = &self.deps.reporting_client {
            let _ = reporting_client
                .report_complete(
                    &self.ctx.run_id,
                    CompleteRequest {
                        error: Some(message.to_string()),
                    },
                )
                .await;
            reporting_client.shutdown();
        }
        self.stop_background_tasks();
        Ok(())
    }

    async fn finalize_cancelled(&self) -> Result<(), OrchestratorError> {
        let end = self.deps.clock.now().timestamp();
        {
            let mut report = self.report.lock();
            report.close(end, RunStatus::Cancelled, "run was cancelled");
        }
        self.persist_report().await?;
        if let Some(reporting_client) = &self.deps.reporting_client {
            let _ = reporting_client
                .report_complete(
                    &self.ctx.run_id,
                    CompleteRequest {
                        error: Some("cancelled".to_string()),
                    },
                )
                .await;
            reporting_client.shutdown();
        }
        self.stop_background_tasks();
        Err(OrchestratorError::Cancelled)
    }

    async fn persist_report(&self) -> Result<(), OrchestratorError> {
        let report = self.report.lock().clone();
        self.deps
            .report_store
            .finalize(&report, &self.ctx.report_base())
            .await?;
        Ok(())
    }

    fn stop_background_tasks(&self) {
        self.cancel.cancel();
        for task in self.background_tasks.lock().drain(..) {
            task.abort();
        }
    }
}

async fn call_with_timeout<T, E, F>(fut: F) -> Option<T>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match tokio::time::timeout(POLL_CALL_TIMEOUT, fut).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "poll call failed, continuing");
            None
        }
        Err(_elapsed) => {
            tracing::warn!("poll call timed out, continuing");
            None
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
