//! Timer record structure and remaining-time arithmetic

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique timer key, matched exactly
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(String);

impl TimerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TimerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TimerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&TimerId> for TimerId {
    fn from(id: &TimerId) -> Self {
        id.clone()
    }
}

/// Lifecycle phase derived from a record's fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    /// Registered, never started
    Idle,
    Running,
    Paused,
}

/// One replicated timer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerRecord {
    pub id: TimerId,
    /// Total configured length in seconds
    pub duration: f64,
    /// Host time the timer began running; 0 means never started
    pub start_time: f64,
    pub is_paused: bool,
    /// Seconds consumed at the moment of pausing
    pub elapsed_when_paused: f64,
}

impl TimerRecord {
    /// Create an idle record
    pub fn new(id: TimerId, duration: f64) -> Self {
        Self {
            id,
            duration,
            start_time: 0.0,
            is_paused: false,
            elapsed_when_paused: 0.0,
        }
    }

    pub fn is_started(&self) -> bool {
        self.start_time > 0.0
    }

    pub fn phase(&self) -> TimerPhase {
        if !self.is_started() {
            TimerPhase::Idle
        } else if self.is_paused {
            TimerPhase::Paused
        } else {
            TimerPhase::Running
        }
    }

    /// Seconds left at host time `now`, clamped to `[0, duration]`
    pub fn remaining_at(&self, now: f64) -> f64 {
        let remaining = match self.phase() {
            TimerPhase::Idle => self.duration,
            TimerPhase::Paused => self.duration - self.elapsed_when_paused,
            TimerPhase::Running => self.duration - (now - self.start_time),
        };
        remaining.clamp(0.0, self.duration.max(0.0))
    }
}
