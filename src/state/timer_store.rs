//! Authoritative timer store
//!
//! Every mutator is gated on the host's role and is a silent no-op when the
//! call is not allowed; the `try_*` twins report why. Each mutation that
//! changes observable state publishes exactly one [`Snapshot`], bulk
//! operations included.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, Weak},
};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info};

use super::{Snapshot, TimerId, TimerRecord};
use crate::{error::TimerError, host::Host};

/// One entry of a bulk registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSpec {
    pub id: TimerId,
    pub duration: f64,
}

impl TimerSpec {
    pub fn new(id: impl Into<TimerId>, duration: f64) -> Self {
        Self {
            id: id.into(),
            duration,
        }
    }
}

/// Mutable store contents, guarded by a single mutex
#[derive(Default)]
struct StoreState {
    records: HashMap<TimerId, TimerRecord>,
    /// Insertion order, for stable snapshots
    order: Vec<TimerId>,
    /// Generation of the currently valid expiry per running timer
    armed: HashMap<TimerId, u64>,
    next_arming: u64,
    revision: u64,
}

impl StoreState {
    fn snapshot(&self) -> Snapshot {
        let timers = self
            .order
            .iter()
            .filter_map(|id| self.records.get(id).cloned())
            .collect();
        Snapshot::new(self.revision, timers)
    }

    fn insert(&mut self, record: TimerRecord) {
        self.order.push(record.id.clone());
        self.records.insert(record.id.clone(), record);
    }

    fn remove(&mut self, id: &TimerId) -> bool {
        self.armed.remove(id);
        if self.records.remove(id).is_some() {
            self.order.retain(|existing| existing != id);
            true
        } else {
            false
        }
    }

    fn arm(&mut self, id: &TimerId) -> u64 {
        self.next_arming += 1;
        self.armed.insert(id.clone(), self.next_arming);
        self.next_arming
    }
}

struct StoreInner {
    host: Arc<dyn Host>,
    state: Mutex<StoreState>,
    snapshot_tx: watch::Sender<Snapshot>,
    /// Keep the receiver alive to prevent channel closure
    _snapshot_rx: watch::Receiver<Snapshot>,
}

/// Server-owned collection of named timers.
///
/// Cloning is cheap and yields another handle to the same store.
#[derive(Clone)]
pub struct TimerStore {
    inner: Arc<StoreInner>,
}

fn validate_duration(id: &TimerId, duration: f64) -> Result<(), TimerError> {
    if duration.is_finite() && duration > 0.0 {
        Ok(())
    } else {
        Err(TimerError::InvalidDuration {
            id: id.clone(),
            duration,
        })
    }
}

fn ignore<T>(operation: &str, result: Result<T, TimerError>) {
    if let Err(e) = result {
        debug!("{} ignored: {}", operation, e);
    }
}

impl TimerStore {
    /// Create an empty store owned by `host`
    pub fn new(host: Arc<dyn Host>) -> Self {
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());
        Self {
            inner: Arc::new(StoreInner {
                host,
                state: Mutex::new(StoreState::default()),
                snapshot_tx,
                _snapshot_rx: snapshot_rx,
            }),
        }
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.inner.host
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Receiver that observes every future publish (latest value wins)
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Remaining seconds for `id`; `None` when the timer is unknown.
    /// Available to every caller regardless of role.
    pub fn remaining_time(&self, id: &TimerId) -> Option<f64> {
        let now = self.inner.host.now();
        match self.inner.state.lock() {
            Ok(state) => state.records.get(id).map(|t| t.remaining_at(now)),
            Err(e) => {
                error!("Failed to lock timer state: {}", e);
                None
            }
        }
    }

    // ─── Silent mutators ────────────────────────────────────────────────────

    pub fn register(&self, id: impl Into<TimerId>, duration: f64) {
        ignore("Register", self.try_register(id, duration));
    }

    pub fn register_many(&self, specs: impl IntoIterator<Item = TimerSpec>) {
        ignore("Bulk register", self.try_register_many(specs));
    }

    pub fn start(&self, id: impl Into<TimerId>) {
        ignore("Start", self.try_start(id));
    }

    pub fn start_many<I>(&self, ids: I)
    where
        I: IntoIterator,
        I::Item: Into<TimerId>,
    {
        ignore("Bulk start", self.try_start_many(ids));
    }

    pub fn pause(&self, id: impl Into<TimerId>) {
        ignore("Pause", self.try_pause(id));
    }

    pub fn pause_many<I>(&self, ids: I)
    where
        I: IntoIterator,
        I::Item: Into<TimerId>,
    {
        ignore("Bulk pause", self.try_pause_many(ids));
    }

    pub fn resume(&self, id: impl Into<TimerId>) {
        ignore("Resume", self.try_resume(id));
    }

    pub fn resume_many<I>(&self, ids: I)
    where
        I: IntoIterator,
        I::Item: Into<TimerId>,
    {
        ignore("Bulk resume", self.try_resume_many(ids));
    }

    pub fn remove(&self, id: impl Into<TimerId>) {
        ignore("Remove", self.try_remove(id));
    }

    // ─── Fallible mutators ──────────────────────────────────────────────────

    /// Insert a new idle timer
    pub fn try_register(&self, id: impl Into<TimerId>, duration: f64) -> Result<(), TimerError> {
        self.authorize()?;
        let id = id.into();
        validate_duration(&id, duration)?;

        let mut state = self.lock()?;
        if state.records.contains_key(&id) {
            return Err(TimerError::AlreadyExists(id));
        }
        state.insert(TimerRecord::new(id.clone(), duration));
        self.publish(&mut state);

        info!("Registered timer {} ({}s)", id, duration);
        Ok(())
    }

    /// Register every valid, new entry; publishes once if anything was added.
    /// Returns the number of timers added.
    pub fn try_register_many(
        &self,
        specs: impl IntoIterator<Item = TimerSpec>,
    ) -> Result<usize, TimerError> {
        self.authorize()?;
        let mut state = self.lock()?;

        let mut added = 0;
        for spec in specs {
            if let Err(e) = validate_duration(&spec.id, spec.duration) {
                debug!("Skipping bulk registration: {}", e);
                continue;
            }
            if state.records.contains_key(&spec.id) {
                debug!("Skipping bulk registration: timer {} already registered", spec.id);
                continue;
            }
            state.insert(TimerRecord::new(spec.id, spec.duration));
            added += 1;
        }

        if added > 0 {
            self.publish(&mut state);
            info!("Registered {} timer(s) in bulk", added);
        }
        Ok(added)
    }

    /// Start a never-started timer and arm its expiry
    pub fn try_start(&self, id: impl Into<TimerId>) -> Result<(), TimerError> {
        self.authorize()?;
        let id = id.into();
        let now = self.now()?;

        let mut state = self.lock()?;
        self.start_locked(&mut state, &id, now)?;
        self.publish(&mut state);

        info!("Started timer {}", id);
        Ok(())
    }

    /// Start each never-started timer in `ids`; unknown ids are skipped.
    /// Uses the same guard as [`TimerStore::try_start`].
    pub fn try_start_many<I>(&self, ids: I) -> Result<usize, TimerError>
    where
        I: IntoIterator,
        I::Item: Into<TimerId>,
    {
        self.authorize()?;
        let now = self.now()?;
        let mut state = self.lock()?;

        let mut started = 0;
        for id in ids {
            let id = id.into();
            match self.start_locked(&mut state, &id, now) {
                Ok(()) => started += 1,
                Err(e) => debug!("Skipping bulk start: {}", e),
            }
        }

        if started > 0 {
            self.publish(&mut state);
            info!("Started {} timer(s) in bulk", started);
        }
        Ok(started)
    }

    /// Freeze a running timer; its pending expiry becomes stale
    pub fn try_pause(&self, id: impl Into<TimerId>) -> Result<(), TimerError> {
        self.authorize()?;
        let id = id.into();
        let now = self.now()?;

        let mut state = self.lock()?;
        Self::pause_locked(&mut state, &id, now)?;
        self.publish(&mut state);

        info!("Paused timer {}", id);
        Ok(())
    }

    pub fn try_pause_many<I>(&self, ids: I) -> Result<usize, TimerError>
    where
        I: IntoIterator,
        I::Item: Into<TimerId>,
    {
        self.authorize()?;
        let now = self.now()?;
        let mut state = self.lock()?;

        let mut paused = 0;
        for id in ids {
            let id = id.into();
            match Self::pause_locked(&mut state, &id, now) {
                Ok(()) => paused += 1,
                Err(e) => debug!("Skipping bulk pause: {}", e),
            }
        }

        if paused > 0 {
            self.publish(&mut state);
            info!("Paused {} timer(s) in bulk", paused);
        }
        Ok(paused)
    }

    /// Unfreeze a paused timer, re-basing its start time so the elapsed
    /// running time carries over, and re-arm expiry for what is left
    pub fn try_resume(&self, id: impl Into<TimerId>) -> Result<(), TimerError> {
        self.authorize()?;
        let id = id.into();
        let now = self.now()?;

        let mut state = self.lock()?;
        self.resume_locked(&mut state, &id, now)?;
        self.publish(&mut state);

        info!("Resumed timer {}", id);
        Ok(())
    }

    pub fn try_resume_many<I>(&self, ids: I) -> Result<usize, TimerError>
    where
        I: IntoIterator,
        I::Item: Into<TimerId>,
    {
        self.authorize()?;
        let now = self.now()?;
        let mut state = self.lock()?;

        let mut resumed = 0;
        for id in ids {
            let id = id.into();
            match self.resume_locked(&mut state, &id, now) {
                Ok(()) => resumed += 1,
                Err(e) => debug!("Skipping bulk resume: {}", e),
            }
        }

        if resumed > 0 {
            self.publish(&mut state);
            info!("Resumed {} timer(s) in bulk", resumed);
        }
        Ok(resumed)
    }

    /// Delete a timer; publishes only when something was deleted
    pub fn try_remove(&self, id: impl Into<TimerId>) -> Result<(), TimerError> {
        self.authorize()?;
        let id = id.into();

        let mut state = self.lock()?;
        if !state.remove(&id) {
            return Err(TimerError::NotFound(id));
        }
        self.publish(&mut state);

        info!("Removed timer {}", id);
        Ok(())
    }

    // ─── Internals ──────────────────────────────────────────────────────────

    fn authorize(&self) -> Result<(), TimerError> {
        if self.inner.host.role().is_authority() {
            Ok(())
        } else {
            Err(TimerError::NotAuthority)
        }
    }

    fn now(&self) -> Result<f64, TimerError> {
        let now = self.inner.host.now();
        if now > 0.0 {
            Ok(now)
        } else {
            Err(TimerError::InvalidClock(now))
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, TimerError> {
        self.inner.state.lock().map_err(|e| {
            error!("Failed to lock timer state: {}", e);
            TimerError::LockPoisoned
        })
    }

    fn publish(&self, state: &mut StoreState) {
        state.revision += 1;
        let snapshot = state.snapshot();
        debug!(
            "Publishing snapshot revision {} ({} timers)",
            snapshot.revision,
            snapshot.len()
        );
        self.inner.snapshot_tx.send_replace(snapshot);
    }

    fn start_locked(
        &self,
        state: &mut StoreState,
        id: &TimerId,
        now: f64,
    ) -> Result<(), TimerError> {
        let record = state
            .records
            .get_mut(id)
            .ok_or_else(|| TimerError::NotFound(id.clone()))?;
        if record.is_started() {
            return Err(TimerError::AlreadyStarted(id.clone()));
        }
        record.start_time = now;
        let duration = record.duration;

        self.arm_expiry(state, id, duration);
        Ok(())
    }

    fn pause_locked(state: &mut StoreState, id: &TimerId, now: f64) -> Result<(), TimerError> {
        let record = state
            .records
            .get_mut(id)
            .ok_or_else(|| TimerError::NotFound(id.clone()))?;
        if !record.is_started() {
            return Err(TimerError::NotRunning(id.clone()));
        }
        if record.is_paused {
            return Err(TimerError::AlreadyPaused(id.clone()));
        }
        record.is_paused = true;
        record.elapsed_when_paused = (now - record.start_time).max(0.0);

        state.armed.remove(id);
        Ok(())
    }

    fn resume_locked(
        &self,
        state: &mut StoreState,
        id: &TimerId,
        now: f64,
    ) -> Result<(), TimerError> {
        let record = state
            .records
            .get_mut(id)
            .ok_or_else(|| TimerError::NotFound(id.clone()))?;
        if !record.is_paused {
            return Err(TimerError::NotPaused(id.clone()));
        }
        record.is_paused = false;
        record.start_time = now - record.elapsed_when_paused;
        let remaining = (record.duration - record.elapsed_when_paused).max(0.0);

        self.arm_expiry(state, id, remaining);
        Ok(())
    }

    fn arm_expiry(&self, state: &mut StoreState, id: &TimerId, delay: f64) {
        let generation = state.arm(id);
        let weak: Weak<StoreInner> = Arc::downgrade(&self.inner);
        let id = id.clone();

        debug!("Arming expiry for timer {} in {}s", id, delay);
        self.inner.host.schedule_once(
            delay,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    TimerStore { inner }.expire(&id, generation);
                }
            }),
        );
    }

    /// Expiry callback body: removes the timer only if this arming is still
    /// the current one. Stale callbacks (after pause, removal or re-arm) do
    /// nothing.
    fn expire(&self, id: &TimerId, generation: u64) {
        if self.authorize().is_err() {
            return;
        }
        let Ok(mut state) = self.lock() else {
            return;
        };

        let current = state.armed.get(id).copied();
        let running = state.records.get(id).is_some_and(|t| !t.is_paused);
        if current != Some(generation) || !running {
            debug!("Ignoring stale expiry for timer {}", id);
            return;
        }

        state.remove(id);
        self.publish(&mut state);
        info!("Timer {} expired", id);
    }
}
