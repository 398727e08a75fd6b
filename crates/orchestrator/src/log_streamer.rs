// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log streamer: attaches to a service's container logs and republishes each
//! line through `tracing`, retrying attach failures with exponential backoff.

use std::sync::Arc;
use std::time::Duration;
use syncoor_adapters::ContainerRuntime;
use syncoor_core::Backoff;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// First this many consecutive attach failures log at `debug` (startup
/// noise while the enclave is still coming up); anything past that is a
/// `warn`.
const DEBUG_FAILURE_BUDGET: u32 = 8;

fn default_backoff() -> Backoff {
    Backoff::new(Duration::from_secs(2), Duration::from_secs(30), 2.0, 10)
}

/// Spawn the background task. Returns immediately; the stream runs until
/// `cancel` fires or retries are exhausted.
pub fn spawn_log_streamer(
    runtime: Arc<dyn ContainerRuntime>,
    container: String,
    client_name: String,
    client_type: String,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(run_log_streamer(
        runtime,
        container,
        client_name,
        client_type,
        cancel,
        default_backoff(),
    ))
}

async fn run_log_streamer(
    runtime: Arc<dyn ContainerRuntime>,
    container: String,
    client_name: String,
    client_type: String,
    cancel: CancellationToken,
    backoff: Backoff,
) {
    let mut attempt = 0u32;
    loop {
        if cancel.is_cancelled() {
            return;
        }
        attempt += 1;
        match runtime.stream_logs(&container).await {
            Ok(Some(rx)) => {
                attempt = 0;
                let drain_name = client_name.clone();
                let drain_type = client_type.clone();
                let drain_cancel = cancel.clone();
                let drain = tokio::spawn(async move {
                    drain_logs(rx, drain_name, drain_type, drain_cancel).await
                });
                match drain.await {
                    Ok(()) => {
                        // channel closed unexpectedly (or cancelled): fall through to retry
                    }
                    Err(join_err) => {
                        tracing::warn!(client = %client_name, error = %join_err, "log drain task panicked");
                    }
                }
                if cancel.is_cancelled() {
                    return;
                }
            }
            Ok(None) => {
                tracing::debug!(client = %client_name, "container has no attachable log stream yet");
            }
            Err(err) => {
                if attempt <= DEBUG_FAILURE_BUDGET {
                    tracing::debug!(client = %client_name, attempt, error = %err, "log attach failed");
                } else {
                    tracing::warn!(client = %client_name, attempt, error = %err, "log attach failed");
                }
            }
        }

        match backoff.delay_for(attempt) {
            Some(delay) => {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            None => {
                tracing::warn!(client = %client_name, "giving up attaching to logs after exhausting retries");
                return;
            }
        }
    }
}

async fn drain_logs(
    mut rx: mpsc::Receiver<String>,
    client_name: String,
    client_type: String,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            line = rx.recv() => {
                match line {
                    Some(line) => {
                        tracing::info!(client = %client_name, client_type = %client_type, line = %line, "container log line");
                    }
                    None => return,
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "log_streamer_tests.rs"]
mod tests;
