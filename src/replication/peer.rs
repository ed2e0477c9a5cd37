//! Replicating peer
//!
//! Every process that observes the timer store (the authority included)
//! runs one `Peer`. It diffs each snapshot it receives against the last one
//! it processed and raises the resulting lifecycle events.

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::{debug, error, info};

use super::{diff::DiffEngine, events::TimerEvent, listeners::TimerListeners};
use crate::{
    host::Host,
    state::{Snapshot, TimerId},
};

/// Capacity of the async event channel
const EVENT_CHANNEL_CAPACITY: usize = 100;

pub struct Peer {
    name: String,
    host: Arc<dyn Host>,
    engine: Mutex<DiffEngine>,
    /// Serializes whole passes: diff plus notification
    dispatch: Mutex<()>,
    listeners: TimerListeners,
    events_tx: broadcast::Sender<TimerEvent>,
}

impl Peer {
    pub fn new(name: impl Into<String>, host: Arc<dyn Host>) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            name: name.into(),
            host,
            engine: Mutex::new(DiffEngine::new()),
            dispatch: Mutex::new(()),
            listeners: TimerListeners::new(),
            events_tx,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn listeners(&self) -> &TimerListeners {
        &self.listeners
    }

    /// Async feed of every event this peer raises
    pub fn subscribe_events(&self) -> broadcast::Receiver<TimerEvent> {
        self.events_tx.subscribe()
    }

    /// Last snapshot this peer processed
    pub fn baseline(&self) -> Snapshot {
        match self.engine.lock() {
            Ok(engine) => engine.baseline().clone(),
            Err(e) => {
                error!("Failed to lock diff engine: {}", e);
                Snapshot::default()
            }
        }
    }

    /// Remaining seconds for `id` as seen by this peer, using its own clock
    pub fn remaining_time(&self, id: &TimerId) -> Option<f64> {
        let now = self.host.now();
        match self.engine.lock() {
            Ok(engine) => engine.baseline().remaining_time(id, now),
            Err(e) => {
                error!("Failed to lock diff engine: {}", e);
                None
            }
        }
    }

    /// Process one received snapshot fully: diff, commit the baseline, then
    /// notify listeners and async subscribers. Passes never interleave.
    pub fn apply(&self, snapshot: &Snapshot) -> Vec<TimerEvent> {
        let Ok(_pass) = self.dispatch.lock() else {
            error!("Peer {} dispatch lock poisoned, dropping snapshot", self.name);
            return Vec::new();
        };

        // The engine lock is released before listeners run so they can query
        // this peer.
        let events = match self.engine.lock() {
            Ok(mut engine) => engine.apply(snapshot),
            Err(e) => {
                error!("Failed to lock diff engine: {}", e);
                return Vec::new();
            }
        };

        for event in &events {
            info!("[{}] timer {} {}", self.name, event.id(), event.kind());
            self.listeners.dispatch(event);
            if self.events_tx.send(event.clone()).is_err() {
                debug!("No async subscribers for peer {}", self.name);
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        host::{ManualHost, Role},
        state::TimerStore,
    };

    fn setup(role: Role) -> (Arc<ManualHost>, TimerStore, Peer) {
        let host = Arc::new(ManualHost::starting_at(role, 50.0));
        let store = TimerStore::new(host.clone());
        let peer = Peer::new("test", host.clone());
        (host, store, peer)
    }

    #[test]
    fn peer_follows_store_lifecycle() {
        let (host, store, peer) = setup(Role::Authority);
        let mut all = Vec::new();

        store.register("round", 10.0);
        all.extend(peer.apply(&store.snapshot()));
        store.start("round");
        all.extend(peer.apply(&store.snapshot()));
        host.advance(2.0);
        store.pause("round");
        all.extend(peer.apply(&store.snapshot()));
        store.resume("round");
        all.extend(peer.apply(&store.snapshot()));
        host.advance(8.0);
        all.extend(peer.apply(&store.snapshot()));

        let id: TimerId = "round".into();
        assert_eq!(
            all,
            vec![
                TimerEvent::Registered {
                    id: id.clone(),
                    duration: 10.0,
                },
                TimerEvent::Started {
                    id: id.clone(),
                    duration: 10.0,
                },
                TimerEvent::Paused { id: id.clone() },
                TimerEvent::Resumed { id: id.clone() },
                TimerEvent::Finished { id },
            ]
        );
    }

    #[test]
    fn peer_computes_remaining_from_replicated_copy() {
        let (host, store, peer) = setup(Role::Authority);
        store.register("round", 10.0);
        store.start("round");
        peer.apply(&store.snapshot());

        host.advance(3.0);
        let id: TimerId = "round".into();
        assert_eq!(peer.remaining_time(&id), Some(7.0));
        assert_eq!(peer.remaining_time(&"ghost".into()), None);
    }

    #[test]
    fn expiry_after_removal_raises_single_finished() {
        let (host, store, peer) = setup(Role::Authority);
        store.register("round", 10.0);
        store.start("round");
        peer.apply(&store.snapshot());

        store.remove("round");
        let first = peer.apply(&store.snapshot());
        host.advance(20.0);
        let second = peer.apply(&store.snapshot());

        assert_eq!(first, vec![TimerEvent::Finished { id: "round".into() }]);
        assert!(second.is_empty());
    }

    #[test]
    fn observer_mutations_raise_no_events() {
        let (_host, store, peer) = setup(Role::Observer);
        store.register("round", 10.0);
        store.start("round");
        assert!(peer.apply(&store.snapshot()).is_empty());
    }

    #[test]
    fn listener_can_query_peer_during_dispatch() {
        let host = Arc::new(ManualHost::starting_at(Role::Authority, 50.0));
        let store = TimerStore::new(host.clone());
        let peer = Arc::new(Peer::new("test", host.clone()));
        let seen = Arc::new(Mutex::new(None));

        let inner_peer = Arc::downgrade(&peer);
        let inner_seen = Arc::clone(&seen);
        peer.listeners().registered.subscribe(move |span| {
            if let Some(peer) = inner_peer.upgrade() {
                *inner_seen.lock().unwrap() = peer.remaining_time(&span.id);
            }
        });

        store.register("round", 4.0);
        peer.apply(&store.snapshot());

        assert_eq!(*seen.lock().unwrap(), Some(4.0));
    }

    #[tokio::test]
    async fn async_subscribers_receive_events() {
        let (_host, store, peer) = setup(Role::Authority);
        let mut rx = peer.subscribe_events();

        store.register("round", 10.0);
        peer.apply(&store.snapshot());

        assert_eq!(
            rx.recv().await.unwrap(),
            TimerEvent::Registered {
                id: "round".into(),
                duration: 10.0,
            }
        );
    }
}
