//! Snapshot replication background task

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::{
    replication::{Peer, TimerEvent},
    state::Snapshot,
};

/// Apply the receiver's latest snapshot to `peer` if it changed since the
/// last call. Returns the raised events, or `None` when nothing was pending
/// or the publisher is gone.
pub fn sync_latest(peer: &Peer, rx: &mut watch::Receiver<Snapshot>) -> Option<Vec<TimerEvent>> {
    match rx.has_changed() {
        Ok(true) => {
            let snapshot = rx.borrow_and_update().clone();
            Some(peer.apply(&snapshot))
        }
        Ok(false) | Err(_) => None,
    }
}

/// Background task that feeds every published snapshot into `peer`.
///
/// The current snapshot is applied first, so a peer joining late still sees
/// `Registered` events for timers that already exist. It never sees `Started`
/// for a timer that was already running, so its board shows such a timer as
/// inactive. Runs until the timer store is dropped.
pub async fn replication_task(peer: Arc<Peer>, mut rx: watch::Receiver<Snapshot>) {
    info!("Starting replication task for peer {}", peer.name());

    let initial = rx.borrow_and_update().clone();
    peer.apply(&initial);

    loop {
        // Wait for a publish
        if rx.changed().await.is_err() {
            info!("Timer store closed, stopping replication for peer {}", peer.name());
            break;
        }
        let snapshot = rx.borrow_and_update().clone();
        let events = peer.apply(&snapshot);
        debug!(
            "Peer {} applied revision {} ({} event(s))",
            peer.name(),
            snapshot.revision,
            events.len()
        );
    }
}
