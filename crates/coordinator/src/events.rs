// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event bus: broadcasts lifecycle events to every SSE subscriber.
//!
//! Each subscriber gets its own bounded lagged-drop queue courtesy of
//! `tokio::sync::broadcast` — a slow subscriber misses old events instead of
//! ever blocking a writer.

use syncoor_core::{RunId, SseEvent, SseEventType};
use tokio::sync::broadcast;

const EVENT_BUS_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SseEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        let (sender, _receiver) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self { sender }
    }
}

impl EventBus {
    pub fn subscribe(&self) -> broadcast::Receiver<SseEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event_type: SseEventType, run_id: &RunId, timestamp: i64, data: serde_json::Value) {
        let event = SseEvent {
            event_type,
            run_id: run_id.clone(),
            timestamp,
            data,
        };
        // No subscribers is not an error: the event is simply dropped.
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
