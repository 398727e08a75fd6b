// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ReportingClient`: pushes keepalives, progress, and completion signals to
//! a coordinator, without ever blocking the orchestrator's poll loop.

use crate::error::ReportClientError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use syncoor_core::{Backoff, CompleteRequest, Keepalive, ProgressEntry, RunId};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const PROGRESS_QUEUE_CAPACITY: usize = 100;
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(180);

/// Hard ceiling on time spent retrying a single push, independent of
/// `Backoff`'s own `max_retries`/`max` cap — the generic `Backoff::default`
/// sums to well over a minute, which is tuned for the log streamer's
/// reattach loop, not a push with its own elapsed budget.
const DEFAULT_RETRY_BUDGET: Duration = Duration::from_secs(30);

/// Reporting client for a single run. One instance per `SyncOrchestrator`.
pub struct ReportingClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    backoff: Backoff,
    retry_budget: Duration,
    progress_tx: Sender<ProgressEntry>,
    progress_rx: Mutex<Option<Receiver<ProgressEntry>>>,
    cancel: CancellationToken,
}

impl ReportingClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, token: Option<String>) -> Self {
        Self::with_backoff(http, base_url, token, Backoff::default())
    }

    pub fn with_backoff(
        http: reqwest::Client,
        base_url: impl Into<String>,
        token: Option<String>,
        backoff: Backoff,
    ) -> Self {
        Self::with_backoff_and_budget(http, base_url, token, backoff, DEFAULT_RETRY_BUDGET)
    }

    /// Like [`Self::with_backoff`] but with an explicit elapsed-time retry
    /// ceiling, mainly for tests that want a short budget.
    pub fn with_backoff_and_budget(
        http: reqwest::Client,
        base_url: impl Into<String>,
        token: Option<String>,
        backoff: Backoff,
        retry_budget: Duration,
    ) -> Self {
        let (progress_tx, progress_rx) = mpsc::channel(PROGRESS_QUEUE_CAPACITY);
        Self {
            http,
            base_url: base_url.into(),
            token,
            backoff,
            retry_budget,
            progress_tx,
            progress_rx: Mutex::new(Some(progress_rx)),
            cancel: CancellationToken::new(),
        }
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Next retry delay, or `None` once either `backoff`'s own retry count is
    /// exhausted or honoring the delay would push total elapsed time past
    /// `retry_budget` — whichever comes first.
    fn next_delay(&self, attempt: u32, elapsed: Duration) -> Option<Duration> {
        let delay = self.backoff.delay_for(attempt)?;
        if elapsed + delay > self.retry_budget {
            return None;
        }
        Some(delay)
    }

    async fn send_with_retry<T: serde::Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &T,
    ) -> Result<(), ReportClientError> {
        let endpoint = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let started = tokio::time::Instant::now();
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let request = self.authed(self.http.request(method.clone(), &endpoint).json(body));
            match request.send().await {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response) if response.status().is_client_error() => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    return Err(ReportClientError::Rejected {
                        endpoint,
                        status,
                        body,
                    });
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    match self.next_delay(attempt, started.elapsed()) {
                        Some(delay) => {
                            tracing::warn!(endpoint = %endpoint, status, attempt, "retrying after server error");
                            tokio::time::sleep(delay).await;
                        }
                        None => {
                            return Err(ReportClientError::RetriesExhausted { endpoint, status })
                        }
                    }
                }
                Err(source) => match self.next_delay(attempt, started.elapsed()) {
                    Some(delay) => {
                        tracing::warn!(endpoint = %endpoint, attempt, error = %source, "retrying after network error");
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(ReportClientError::Request { endpoint, source }),
                },
            }
        }
    }

    /// Send a keepalive synchronously.
    pub async fn report_keepalive(&self, keepalive: &Keepalive) -> Result<(), ReportClientError> {
        self.send_with_retry(reqwest::Method::POST, "/api/v1/tests/keepalive", keepalive)
            .await
    }

    /// Spawn the background timer that resends `keepalive` every 3 minutes
    /// with a refreshed timestamp, until cancelled.
    pub fn spawn_keepalive_timer(
        self: &Arc<Self>,
        keepalive: Keepalive,
    ) -> JoinHandle<()> {
        let client = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = client.cancel.cancelled() => return,
                    _ = tokio::time::sleep(KEEPALIVE_INTERVAL) => {
                        if let Err(err) = client.report_keepalive(&keepalive).await {
                            tracing::warn!(error = %err, "periodic keepalive failed");
                        }
                    }
                }
            }
        })
    }

    /// Non-blocking enqueue; drops the newest sample and logs a warning when
    /// the queue is full or the worker has shut down.
    pub fn report_progress(&self, entry: ProgressEntry) {
        match self.progress_tx.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!("progress queue full, dropping newest sample");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!("progress worker not running, dropping sample");
            }
        }
    }

    /// Spawn the worker that drains the progress queue and forwards each
    /// entry to the coordinator, retrying transient failures in place.
    pub fn spawn_progress_worker(self: &Arc<Self>, run_id: RunId) -> JoinHandle<()> {
        let client = Arc::clone(self);
        let rx = client.progress_rx.lock().take();
        tokio::spawn(async move {
            let Some(mut rx) = rx else {
                tracing::error!("spawn_progress_worker called more than once; no receiver to drain");
                return;
            };
            let path = format!("/api/v1/tests/{run_id}/progress");
            loop {
                tokio::select! {
                    _ = client.cancel.cancelled() => return,
                    entry = rx.recv() => {
                        let Some(entry) = entry else { return };
                        if let Err(err) = client
                            .send_with_retry(reqwest::Method::POST, &path, &entry)
                            .await
                        {
                            tracing::warn!(error = %err, "dropping progress update after retries exhausted");
                        }
                    }
                }
            }
        })
    }

    /// Send the terminal completion signal synchronously.
    pub async fn report_complete(
        &self,
        run_id: &RunId,
        complete: CompleteRequest,
    ) -> Result<(), ReportClientError> {
        let path = format!("/api/v1/tests/{run_id}/complete");
        self.send_with_retry(reqwest::Method::POST, &path, &complete)
            .await
    }

    /// Stop the keepalive timer and progress worker; in-flight calls observe
    /// cancellation on their next await point.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
