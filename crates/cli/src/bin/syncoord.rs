// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `syncoord`: the coordinator HTTP/SSE server. Tests are held in memory;
//! nothing is persisted across restarts.

use anyhow::{Context, Result};
use clap::Parser;
use chrono::Duration as ChronoDuration;
use std::net::SocketAddr;
use std::sync::Arc;
use syncoor_coordinator::{build_router, spawn_maintenance_loop, AppState, CoordinatorStore, StoreConfig};
use syncoor_core::{Clock, SystemClock};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Parser)]
#[command(name = "syncoord", about = "Sync-benchmark coordinator HTTP/SSE server")]
struct CoordinatorArgs {
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    #[arg(long, env = "SYNCOOR_TOKEN")]
    token: Option<String>,

    #[arg(long = "max-history", default_value_t = 1000)]
    max_history: usize,

    /// Minutes of keepalive silence before a test is marked orphaned.
    #[arg(long = "orphan-threshold", default_value_t = 10)]
    orphan_threshold: i64,

    /// Minutes an orphaned test lingers before it is evicted.
    #[arg(long = "cleanup-threshold", default_value_t = 20)]
    cleanup_threshold: i64,

    /// Hours a completed test is retained before eviction regardless of state.
    #[arg(long = "max-age", default_value_t = 24)]
    max_age: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = CoordinatorArgs::parse();

    let config = StoreConfig {
        max_history: args.max_history,
        orphan_threshold: ChronoDuration::minutes(args.orphan_threshold),
        cleanup_threshold: ChronoDuration::minutes(args.cleanup_threshold),
        max_age: ChronoDuration::hours(args.max_age),
    };
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = Arc::new(CoordinatorStore::new(config, clock.clone()));

    let cancel = CancellationToken::new();
    let maintenance = spawn_maintenance_loop(store.clone(), cancel.clone());

    let state = Arc::new(AppState {
        store,
        events: Default::default(),
        token: args.token,
        clock,
    });
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("binding {}", args.bind))?;
    tracing::info!(bind = %args.bind, "coordinator listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("coordinator server error")?;

    cancel.cancel();
    let _ = maintenance.await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(err) => {
                tracing::error!(error = %err, "failed to install ctrl-c handler; disabling this shutdown path");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler; disabling this shutdown path");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_env("SYNCOOR_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
