// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Axum HTTP/SSE surface: keepalive, progress, complete, list, detail, events.

use crate::error::StoreError;
use crate::events::EventBus;
use crate::store::CoordinatorStore;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use syncoor_core::{Clock, CompleteRequest, Keepalive, ProgressEntry, RunId, SseEventType};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

pub struct AppState {
    pub store: Arc<CoordinatorStore>,
    pub events: EventBus,
    pub token: Option<String>,
    pub clock: Arc<dyn Clock>,
}

/// `{data?, error?: {code, message}}` response envelope.
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let status =
            StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self {
            status,
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": { "code": self.code, "message": self.message }
        });
        (self.status, Json(body)).into_response()
    }
}

fn ok<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "data": data }))
}

async fn post_keepalive(
    State(state): State<Arc<AppState>>,
    Json(keepalive): Json<Keepalive>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let run_id = keepalive.run_id.clone();
    let now = state.clock.now();
    let created = match state.store.create_test(keepalive) {
        Ok(data) => Some(data),
        Err(StoreError::TestData(syncoor_core::TestDataError::AlreadyExists)) => {
            state.store.update_keepalive(&run_id)?;
            None
        }
        Err(other) => return Err(other.into()),
    };
    if created.is_some() {
        state.events.publish(
            SseEventType::TestStart,
            &run_id,
            now.timestamp(),
            serde_json::json!({"run_id": run_id.as_str()}),
        );
    }
    Ok(ok(serde_json::json!({"run_id": run_id.as_str()})))
}

async fn post_progress(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
    Json(entry): Json<ProgressEntry>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let run_id = RunId::new(run_id);
    state.store.update_progress(&run_id, entry)?;
    state.events.publish(
        SseEventType::TestProgress,
        &run_id,
        state.clock.now().timestamp(),
        serde_json::to_value(entry).unwrap_or_default(),
    );
    Ok(ok(serde_json::json!({})))
}

async fn post_complete(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
    Json(complete): Json<CompleteRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let run_id = RunId::new(run_id);
    state.store.complete_test(&run_id, complete.clone())?;
    state.events.publish(
        SseEventType::TestComplete,
        &run_id,
        state.clock.now().timestamp(),
        serde_json::json!({"error": complete.error}),
    );
    Ok(ok(serde_json::json!({})))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    active: Option<bool>,
}

async fn list_tests(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Json<serde_json::Value> {
    let tests = state.store.list(query.active);
    ok(tests)
}

async fn get_test(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let data = state.store.get(&RunId::new(run_id))?;
    Ok(ok(data))
}

async fn get_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.events.subscribe()).filter_map(|msg| match msg {
        Ok(event) => serde_json::to_string(&event)
            .ok()
            .map(|data| Ok(Event::default().event(event.event_type.as_str()).data(data))),
        Err(_lagged) => None,
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let Some(expected) = &state.token else {
        return next.run(request).await;
    };
    let provided = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    match provided {
        Some(token) if token == expected => next.run(request).await,
        _ => ApiError {
            status: StatusCode::UNAUTHORIZED,
            code: "unauthorized",
            message: "missing or invalid bearer token".to_string(),
        }
        .into_response(),
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/tests/keepalive", post(post_keepalive))
        .route("/api/v1/tests/:id/progress", post(post_progress))
        .route("/api/v1/tests/:id/complete", post(post_complete))
        .route("/api/v1/tests", get(list_tests))
        .route("/api/v1/tests/:id", get(get_test))
        .route("/api/v1/events", get(get_events))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::catch_panic::CatchPanicLayer::new())
        .with_state(state)
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
