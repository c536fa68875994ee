// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! HTTP surface over the snapshot hub.
//!
//! | route | |
//! |---|---|
//! | `GET /api/snapshot` | latest snapshot as JSON |
//! | `GET /api/events` | server-sent events: `current`, then `cycle` / `skipped` / `reset` |
//! | `POST /api/reset` | clear history, returns the empty snapshot |
//! | `GET /health` | sampler liveness |

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{Stream, StreamExt};
use hydrowatch_core::{warn, Snapshot, SnapshotEvent};
use hydrowatch_error::HydroError;
use hydrowatch_exec::{HealthReport, SampleCoordinator, SamplerHealth};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const KEEP_ALIVE: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct AppState {
    coordinator: Arc<SampleCoordinator>,
    health: Arc<SamplerHealth>,
}

impl AppState {
    #[must_use]
    pub fn new(coordinator: Arc<SampleCoordinator>, health: Arc<SamplerHealth>) -> Self {
        Self {
            coordinator,
            health,
        }
    }
}

#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/snapshot", get(snapshot))
        .route("/api/events", get(events))
        .route("/api/reset", post(reset))
        .route("/health", get(health))
        .with_state(state)
}

/// A [`HydroError`] rendered as a JSON response.
pub struct ApiError(HydroError);

impl From<HydroError> for ApiError {
    fn from(err: HydroError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_recoverable() || matches!(self.0, HydroError::Closed) {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = json!({
            "error": self.0.to_string(),
            "retryable": self.0.is_recoverable(),
        });
        (status, Json(body)).into_response()
    }
}

async fn snapshot(State(state): State<AppState>) -> Json<Arc<Snapshot>> {
    Json(state.coordinator.hub().current())
}

async fn events(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let updates = state.coordinator.hub().subscribe()?;
    let stream = updates.map(|event: SnapshotEvent| {
        Event::default()
            .event(event.kind())
            .id(event.snapshot().version.to_string())
            .json_data(&event)
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE).text("ping")))
}

async fn reset(State(state): State<AppState>) -> Result<Json<Arc<Snapshot>>, ApiError> {
    let snapshot = state.coordinator.reset().map_err(|err| {
        warn!("Reset failed: {}", err);
        err
    })?;
    Ok(Json(snapshot))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthBody {
    status: &'static str,
    sampler: HealthReport,
    version: u64,
    cycle_count: u64,
    subscribers: usize,
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthBody>) {
    let sampler = state.health.report();
    let current = state.coordinator.hub().current();
    let (status, label) = if sampler.running {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "stopped")
    };

    let body = HealthBody {
        status: label,
        sampler,
        version: current.version,
        cycle_count: current.cycle_count,
        subscribers: state.coordinator.hub().subscriber_count(),
    };
    (status, Json(body))
}
