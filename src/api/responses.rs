//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    host::Role,
    state::{Snapshot, TimerId, TimerPhase, TimerRecord},
    utils::format_countdown,
};

/// Body for the bulk start/pause/resume endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerIdsRequest {
    pub ids: Vec<TimerId>,
}

/// One timer as reported to HTTP clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerView {
    pub id: TimerId,
    pub duration: f64,
    pub phase: TimerPhase,
    pub remaining_seconds: f64,
    pub remaining: String,
}

impl TimerView {
    pub fn from_record(record: &TimerRecord, now: f64) -> Self {
        let remaining_seconds = record.remaining_at(now);
        Self {
            id: record.id.clone(),
            duration: record.duration,
            phase: record.phase(),
            remaining_seconds,
            remaining: format_countdown(remaining_seconds),
        }
    }
}

fn views(snapshot: &Snapshot, now: f64) -> Vec<TimerView> {
    snapshot
        .iter()
        .map(|record| TimerView::from_record(record, now))
        .collect()
}

/// Response to every mutating endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    /// "applied" or "ignored"
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub revision: u64,
    pub timers: Vec<TimerView>,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: &str, message: String, snapshot: &Snapshot, now: f64) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            revision: snapshot.revision,
            timers: views(snapshot, now),
        }
    }

    /// Create an applied response
    pub fn applied(message: String, snapshot: &Snapshot, now: f64) -> Self {
        Self::new("applied", message, snapshot, now)
    }

    /// Create an ignored response carrying the rejection reason
    pub fn ignored(reason: String, snapshot: &Snapshot, now: f64) -> Self {
        Self::new("ignored", reason, snapshot, now)
    }
}

/// Response for GET /timers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub revision: u64,
    pub timestamp: DateTime<Utc>,
    pub timers: Vec<TimerView>,
}

impl SnapshotResponse {
    pub fn new(snapshot: &Snapshot, now: f64) -> Self {
        Self {
            revision: snapshot.revision,
            timestamp: Utc::now(),
            timers: views(snapshot, now),
        }
    }
}

/// Response for GET /timers/:id/remaining
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemainingResponse {
    pub id: TimerId,
    pub found: bool,
    pub remaining_seconds: f64,
    pub remaining: String,
}

impl RemainingResponse {
    pub fn new(id: TimerId, remaining: Option<f64>) -> Self {
        let remaining_seconds = remaining.unwrap_or(0.0);
        Self {
            id,
            found: remaining.is_some(),
            remaining_seconds,
            remaining: format_countdown(remaining_seconds),
        }
    }
}

/// One countdown board row with the peer's current remaining time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardRow {
    pub id: TimerId,
    pub active: bool,
    pub remaining: String,
}

/// Response for GET /board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardResponse {
    pub peer: String,
    pub rows: Vec<BoardRow>,
}

/// Status response with store and server metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub role: Role,
    pub revision: u64,
    pub timer_count: usize,
    pub running_count: usize,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
