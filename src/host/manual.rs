//! Deterministic host with a hand-driven clock

use std::sync::Mutex;

use tracing::{debug, error};

use super::{Callback, Host, Role};

struct Pending {
    due: f64,
    seq: u64,
    callback: Callback,
}

struct ManualState {
    now: f64,
    next_seq: u64,
    pending: Vec<Pending>,
}

/// Host whose time only moves when [`ManualHost::advance`] is called.
///
/// Scheduled callbacks are queued and fired from `advance`, in due order,
/// with the clock set to each callback's due time. No lock is held while a
/// callback runs, so callbacks may freely schedule more work.
pub struct ManualHost {
    role: Role,
    state: Mutex<ManualState>,
}

impl ManualHost {
    /// Default starting clock value (seconds)
    pub const DEFAULT_START: f64 = 1.0;

    pub fn new(role: Role) -> Self {
        Self::starting_at(role, Self::DEFAULT_START)
    }

    /// Create a host whose clock starts at `now`
    pub fn starting_at(role: Role, now: f64) -> Self {
        Self {
            role,
            state: Mutex::new(ManualState {
                now,
                next_seq: 0,
                pending: Vec::new(),
            }),
        }
    }

    /// Number of callbacks waiting to fire
    pub fn pending(&self) -> usize {
        self.state.lock().map(|s| s.pending.len()).unwrap_or(0)
    }

    /// Move the clock forward by `secs`, firing every callback that comes due.
    /// Returns how many callbacks fired.
    pub fn advance(&self, secs: f64) -> usize {
        let target = match self.state.lock() {
            Ok(state) => state.now + secs.max(0.0),
            Err(e) => {
                error!("Manual host lock poisoned: {}", e);
                return 0;
            }
        };

        let mut fired = 0;
        loop {
            let next = {
                let Ok(mut state) = self.state.lock() else {
                    error!("Manual host lock poisoned while advancing");
                    return fired;
                };

                let due_index = state
                    .pending
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.due <= target)
                    .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)))
                    .map(|(i, _)| i);

                match due_index {
                    Some(i) => {
                        let pending = state.pending.remove(i);
                        state.now = state.now.max(pending.due);
                        pending.callback
                    }
                    None => {
                        state.now = target;
                        break;
                    }
                }
            };

            next();
            fired += 1;
        }

        if fired > 0 {
            debug!("Manual host fired {} callback(s)", fired);
        }
        fired
    }
}

impl Host for ManualHost {
    fn now(&self) -> f64 {
        self.state.lock().map(|s| s.now).unwrap_or(0.0)
    }

    fn role(&self) -> Role {
        self.role
    }

    fn schedule_once(&self, delay_secs: f64, callback: Callback) {
        let Ok(mut state) = self.state.lock() else {
            error!("Manual host lock poisoned, dropping scheduled callback");
            return;
        };
        let due = state.now + delay_secs.max(0.0);
        let seq = state.next_seq;
        state.next_seq += 1;
        state.pending.push(Pending { due, seq, callback });
    }
}
