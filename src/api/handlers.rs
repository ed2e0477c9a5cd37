//! HTTP endpoint handlers
//!
//! Rejected mutations are not HTTP errors: they come back as
//! `status: "ignored"` with the reason, alongside the unchanged timers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use super::responses::{
    ApiResponse, BoardResponse, BoardRow, HealthResponse, RemainingResponse, SnapshotResponse,
    StatusResponse, TimerIdsRequest,
};
use crate::{
    error::TimerError,
    state::{AppState, TimerId, TimerPhase, TimerSpec},
    utils::format_countdown,
};

/// Build the response for a single-timer mutation
fn outcome(state: &AppState, action: String, result: Result<(), TimerError>) -> Json<ApiResponse> {
    let snapshot = state.store.snapshot();
    let now = state.store.host().now();
    match result {
        Ok(()) => {
            info!("{}", action);
            state.record_action(action.clone());
            Json(ApiResponse::applied(action, &snapshot, now))
        }
        Err(e) => {
            debug!("{} ignored: {}", action, e);
            Json(ApiResponse::ignored(e.to_string(), &snapshot, now))
        }
    }
}

/// Build the response for a bulk mutation
fn bulk_outcome(
    state: &AppState,
    verb: &str,
    result: Result<usize, TimerError>,
) -> Json<ApiResponse> {
    let snapshot = state.store.snapshot();
    let now = state.store.host().now();
    match result {
        Ok(0) => Json(ApiResponse::ignored(
            format!("no timers {}", verb),
            &snapshot,
            now,
        )),
        Ok(count) => {
            let action = format!("{} {} timer(s)", verb, count);
            info!("Bulk: {}", action);
            state.record_action(action.clone());
            Json(ApiResponse::applied(action, &snapshot, now))
        }
        Err(e) => {
            debug!("Bulk {} ignored: {}", verb, e);
            Json(ApiResponse::ignored(e.to_string(), &snapshot, now))
        }
    }
}

/// Handle GET /timers - Current snapshot with remaining times
pub async fn list_timers_handler(State(state): State<Arc<AppState>>) -> Json<SnapshotResponse> {
    let now = state.store.host().now();
    Json(SnapshotResponse::new(&state.store.snapshot(), now))
}

/// Handle POST /timers - Register one timer
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(spec): Json<TimerSpec>,
) -> Json<ApiResponse> {
    let action = format!("registered {} ({}s)", spec.id, spec.duration);
    let result = state.store.try_register(spec.id, spec.duration);
    outcome(&state, action, result)
}

/// Handle POST /timers/bulk - Register many timers with one publish
pub async fn register_bulk_handler(
    State(state): State<Arc<AppState>>,
    Json(specs): Json<Vec<TimerSpec>>,
) -> Json<ApiResponse> {
    let result = state.store.try_register_many(specs);
    bulk_outcome(&state, "registered", result)
}

/// Handle POST /timers/start - Start many timers
pub async fn start_many_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TimerIdsRequest>,
) -> Json<ApiResponse> {
    let result = state.store.try_start_many(request.ids);
    bulk_outcome(&state, "started", result)
}

/// Handle POST /timers/pause - Pause many timers
pub async fn pause_many_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TimerIdsRequest>,
) -> Json<ApiResponse> {
    let result = state.store.try_pause_many(request.ids);
    bulk_outcome(&state, "paused", result)
}

/// Handle POST /timers/resume - Resume many timers
pub async fn resume_many_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TimerIdsRequest>,
) -> Json<ApiResponse> {
    let result = state.store.try_resume_many(request.ids);
    bulk_outcome(&state, "resumed", result)
}

/// Handle POST /timers/:id/start
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<ApiResponse> {
    let result = state.store.try_start(id.as_str());
    outcome(&state, format!("started {}", id), result)
}

/// Handle POST /timers/:id/pause
pub async fn pause_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<ApiResponse> {
    let result = state.store.try_pause(id.as_str());
    outcome(&state, format!("paused {}", id), result)
}

/// Handle POST /timers/:id/resume
pub async fn resume_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<ApiResponse> {
    let result = state.store.try_resume(id.as_str());
    outcome(&state, format!("resumed {}", id), result)
}

/// Handle DELETE /timers/:id
pub async fn remove_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<ApiResponse> {
    let result = state.store.try_remove(id.as_str());
    outcome(&state, format!("removed {}", id), result)
}

/// Handle GET /timers/:id/remaining - Remaining-time query, any role
pub async fn remaining_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<RemainingResponse> {
    let id = TimerId::from(id);
    let remaining = state.store.remaining_time(&id);
    Json(RemainingResponse::new(id, remaining))
}

/// Handle GET /board - The local peer's countdown board
pub async fn board_handler(State(state): State<Arc<AppState>>) -> Json<BoardResponse> {
    let rows = state
        .board
        .entries()
        .into_iter()
        .map(|entry| {
            let remaining = state.peer.remaining_time(&entry.id).unwrap_or(0.0);
            BoardRow {
                id: entry.id,
                active: entry.active,
                remaining: format_countdown(remaining),
            }
        })
        .collect();

    Json(BoardResponse {
        peer: state.peer.name().to_string(),
        rows,
    })
}

/// Handle GET /events - Server-sent stream of the local peer's events
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let rx = state.peer.subscribe_events();
    info!("Event stream client connected");

    let events = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let sse = Event::default().event(event.kind()).json_data(&event);
                    return Some((sse, rx));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event stream lagged, skipped {} event(s)", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Handle GET /status - Return current store status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let snapshot = state.store.snapshot();
    let running_count = snapshot
        .iter()
        .filter(|t| t.phase() == TimerPhase::Running)
        .count();
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        role: state.role(),
        revision: snapshot.revision,
        timer_count: snapshot.len(),
        running_count,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
