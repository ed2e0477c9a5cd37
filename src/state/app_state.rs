//! Application state shared by the HTTP handlers

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

use chrono::{DateTime, Utc};
use tracing::warn;

use super::TimerStore;
use crate::{
    host::Role,
    replication::{CountdownBoard, Peer},
};

/// Everything a request handler can reach
pub struct AppState {
    /// Authoritative store (mutations are gated on its host's role)
    pub store: TimerStore,
    /// This process's own replicating peer
    pub peer: Arc<Peer>,
    /// Board following `peer`
    pub board: CountdownBoard,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    /// Wire a store and its local peer together with a board attached to the
    /// peer's listeners
    pub fn new(store: TimerStore, peer: Arc<Peer>, port: u16, host: String) -> Self {
        let board = CountdownBoard::new();
        board.attach(peer.listeners());

        Self {
            store,
            peer,
            board,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
        }
    }

    pub fn role(&self) -> Role {
        self.store.host().role()
    }

    /// Record an accepted mutation for the status endpoint
    pub fn record_action(&self, action: impl Into<String>) {
        match self.last_action.lock() {
            Ok(mut last_action) => *last_action = Some(action.into()),
            Err(e) => warn!("Failed to record last action: {}", e),
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
