// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event-bus payloads broadcast by the coordinator over SSE.

use crate::ids::RunId;
use serde::{Deserialize, Serialize};

/// The three lifecycle events a run can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SseEventType {
    TestStart,
    TestProgress,
    TestComplete,
}

impl SseEventType {
    /// The string used on the wire as the SSE `event:` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            SseEventType::TestStart => "test_start",
            SseEventType::TestProgress => "test_progress",
            SseEventType::TestComplete => "test_complete",
        }
    }
}

/// One event delivered to subscribers of `GET /api/v1/events`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SseEvent {
    #[serde(rename = "type")]
    pub event_type: SseEventType,
    pub run_id: RunId,
    pub timestamp: i64,
    pub data: serde_json::Value,
}
