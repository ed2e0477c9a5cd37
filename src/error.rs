//! Error types for the fallible timer mutators
//!
//! The default store methods never surface these; they log and drop them.
//! The `try_*` variants return them so callers (like the HTTP layer) can
//! report why a mutation was ignored.

use thiserror::Error;

use crate::state::TimerId;

/// Reasons a timer mutation was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimerError {
    #[error("caller does not hold authority over the timer store")]
    NotAuthority,

    #[error("timer {0} is already registered")]
    AlreadyExists(TimerId),

    #[error("timer {id} has invalid duration {duration}")]
    InvalidDuration { id: TimerId, duration: f64 },

    #[error("timer {0} is not registered")]
    NotFound(TimerId),

    #[error("timer {0} has already been started")]
    AlreadyStarted(TimerId),

    #[error("timer {0} is not running")]
    NotRunning(TimerId),

    #[error("timer {0} is already paused")]
    AlreadyPaused(TimerId),

    #[error("timer {0} is not paused")]
    NotPaused(TimerId),

    #[error("host clock reported non-positive time {0}")]
    InvalidClock(f64),

    #[error("timer state lock poisoned")]
    LockPoisoned,
}
