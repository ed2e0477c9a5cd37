//! Timer lifecycle events

use serde::{Deserialize, Serialize};

use crate::state::TimerId;

/// Timer id plus its configured duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSpan {
    pub id: TimerId,
    pub duration: f64,
}

/// A lifecycle transition derived by diffing two snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TimerEvent {
    Registered { id: TimerId, duration: f64 },
    Started { id: TimerId, duration: f64 },
    Paused { id: TimerId },
    Resumed { id: TimerId },
    Finished { id: TimerId },
}

impl TimerEvent {
    pub fn id(&self) -> &TimerId {
        match self {
            TimerEvent::Registered { id, .. }
            | TimerEvent::Started { id, .. }
            | TimerEvent::Paused { id }
            | TimerEvent::Resumed { id }
            | TimerEvent::Finished { id } => id,
        }
    }

    /// Short lowercase name, also used as the SSE event name
    pub fn kind(&self) -> &'static str {
        match self {
            TimerEvent::Registered { .. } => "registered",
            TimerEvent::Started { .. } => "started",
            TimerEvent::Paused { .. } => "paused",
            TimerEvent::Resumed { .. } => "resumed",
            TimerEvent::Finished { .. } => "finished",
        }
    }
}
