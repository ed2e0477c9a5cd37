//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/timers", get(list_timers_handler).post(register_handler))
        .route("/timers/bulk", post(register_bulk_handler))
        .route("/timers/start", post(start_many_handler))
        .route("/timers/pause", post(pause_many_handler))
        .route("/timers/resume", post(resume_many_handler))
        .route("/timers/:id", delete(remove_handler))
        .route("/timers/:id/start", post(start_handler))
        .route("/timers/:id/pause", post(pause_handler))
        .route("/timers/:id/resume", post(resume_handler))
        .route("/timers/:id/remaining", get(remaining_handler))
        .route("/board", get(board_handler))
        .route("/events", get(events_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
