// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic maintenance: orphan marking, orphan cleanup, and max-age eviction.

use crate::store::CoordinatorStore;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(20 * 60);

/// Spawn the maintenance loop; it ticks every ~20 minutes until `cancel` fires.
pub fn spawn_maintenance_loop(
    store: Arc<CoordinatorStore>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(MAINTENANCE_INTERVAL) => {
                    run_tick(&store);
                }
            }
        }
    })
}

fn run_tick(store: &CoordinatorStore) {
    let evicted = store.cleanup();
    let orphaned = store.mark_orphaned_tests();
    let cleaned = store.cleanup_orphaned_tests();
    tracing::info!(evicted, orphaned, cleaned, "maintenance tick complete");
}

#[cfg(test)]
#[path = "maintenance_tests.rs"]
mod tests;
