//! Published timer snapshot

use serde::{Deserialize, Serialize};

use super::{TimerId, TimerRecord};

/// Full ordered set of timer records at one instant.
///
/// `revision` counts publishes; it plays no part in diffing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub revision: u64,
    pub timers: Vec<TimerRecord>,
}

impl Snapshot {
    pub fn new(revision: u64, timers: Vec<TimerRecord>) -> Self {
        Self { revision, timers }
    }

    pub fn get(&self, id: &TimerId) -> Option<&TimerRecord> {
        self.timers.iter().find(|t| &t.id == id)
    }

    pub fn contains(&self, id: &TimerId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimerRecord> {
        self.timers.iter()
    }

    /// Remaining seconds for `id` at host time `now`, `None` if unknown
    pub fn remaining_time(&self, id: &TimerId, now: f64) -> Option<f64> {
        self.get(id).map(|t| t.remaining_at(now))
    }
}
