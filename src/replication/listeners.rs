//! Multicast listener channels
//!
//! Dispatch works on a copy of the handler list taken under the lock, so a
//! handler may subscribe or unsubscribe (itself or others) while an event is
//! being delivered. Such changes take effect from the next dispatch.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};

use tracing::error;

use super::events::{TimerEvent, TimerSpan};
use crate::state::TimerId;

/// Handle returned by [`Multicast::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Zero or more independent subscribers to one kind of notification
pub struct Multicast<T> {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(SubscriptionId, Handler<T>)>>,
}

impl<T> Default for Multicast<T> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            handlers: Mutex::new(Vec::new()),
        }
    }
}

impl<T> Multicast<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        match self.handlers.lock() {
            Ok(mut handlers) => handlers.push((id, Arc::new(handler))),
            Err(e) => error!("Failed to lock listener list: {}", e),
        }
        id
    }

    /// Returns whether a subscription was removed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        match self.handlers.lock() {
            Ok(mut handlers) => {
                let before = handlers.len();
                handlers.retain(|(existing, _)| *existing != id);
                handlers.len() != before
            }
            Err(e) => {
                error!("Failed to lock listener list: {}", e);
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.lock().map(|h| h.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn broadcast(&self, value: &T) {
        let handlers: Vec<Handler<T>> = match self.handlers.lock() {
            Ok(handlers) => handlers.iter().map(|(_, h)| Arc::clone(h)).collect(),
            Err(e) => {
                error!("Failed to lock listener list: {}", e);
                return;
            }
        };
        for handler in handlers {
            handler(value);
        }
    }
}

/// The five lifecycle channels a peer exposes
#[derive(Default)]
pub struct TimerListeners {
    pub registered: Multicast<TimerSpan>,
    pub started: Multicast<TimerSpan>,
    pub finished: Multicast<TimerId>,
    pub paused: Multicast<TimerId>,
    pub resumed: Multicast<TimerId>,
}

impl TimerListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route an event to its channel
    pub fn dispatch(&self, event: &TimerEvent) {
        match event {
            TimerEvent::Registered { id, duration } => self.registered.broadcast(&TimerSpan {
                id: id.clone(),
                duration: *duration,
            }),
            TimerEvent::Started { id, duration } => self.started.broadcast(&TimerSpan {
                id: id.clone(),
                duration: *duration,
            }),
            TimerEvent::Paused { id } => self.paused.broadcast(id),
            TimerEvent::Resumed { id } => self.resumed.broadcast(id),
            TimerEvent::Finished { id } => self.finished.broadcast(id),
        }
    }
}
