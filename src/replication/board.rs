//! Headless countdown board
//!
//! Tracks which timers a display would currently show and whether each is
//! ticking, driven purely by a peer's lifecycle events.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::error;

use super::{
    events::TimerSpan,
    listeners::{SubscriptionId, TimerListeners},
};
use crate::state::TimerId;

/// One board row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardEntry {
    pub id: TimerId,
    pub duration: f64,
    /// True while the timer is counting down
    pub active: bool,
}

#[derive(Default)]
struct BoardState {
    entries: Vec<BoardEntry>,
}

impl BoardState {
    fn set_active(&mut self, id: &TimerId, active: bool) {
        if let Some(entry) = self.entries.iter_mut().find(|e| &e.id == id) {
            entry.active = active;
        }
    }
}

struct Subscriptions {
    registered: SubscriptionId,
    started: SubscriptionId,
    paused: SubscriptionId,
    resumed: SubscriptionId,
    finished: SubscriptionId,
}

pub struct CountdownBoard {
    filter: Option<TimerId>,
    state: Arc<Mutex<BoardState>>,
    subscriptions: Mutex<Option<Subscriptions>>,
}

fn lock(state: &Mutex<BoardState>) -> Option<MutexGuard<'_, BoardState>> {
    match state.lock() {
        Ok(guard) => Some(guard),
        Err(e) => {
            error!("Failed to lock countdown board: {}", e);
            None
        }
    }
}

impl CountdownBoard {
    /// Board showing every timer
    pub fn new() -> Self {
        Self::with_filter(None)
    }

    /// Board showing only the timer with exactly this id, or all when `None`
    pub fn with_filter(filter: Option<TimerId>) -> Self {
        Self {
            filter,
            state: Arc::new(Mutex::new(BoardState::default())),
            subscriptions: Mutex::new(None),
        }
    }

    /// Start following `listeners`. Attaching an already attached board is a
    /// no-op.
    pub fn attach(&self, listeners: &TimerListeners) {
        let Ok(mut subscriptions) = self.subscriptions.lock() else {
            error!("Failed to lock board subscriptions");
            return;
        };
        if subscriptions.is_some() {
            return;
        }

        let state = Arc::clone(&self.state);
        let filter = self.filter.clone();
        let registered = listeners.registered.subscribe(move |span: &TimerSpan| {
            if filter.as_ref().is_some_and(|f| f != &span.id) {
                return;
            }
            if let Some(mut board) = lock(&state) {
                if !board.entries.iter().any(|e| e.id == span.id) {
                    board.entries.push(BoardEntry {
                        id: span.id.clone(),
                        duration: span.duration,
                        active: false,
                    });
                }
            }
        });

        let state = Arc::clone(&self.state);
        let started = listeners.started.subscribe(move |span: &TimerSpan| {
            if let Some(mut board) = lock(&state) {
                board.set_active(&span.id, true);
            }
        });

        let state = Arc::clone(&self.state);
        let paused = listeners.paused.subscribe(move |id: &TimerId| {
            if let Some(mut board) = lock(&state) {
                board.set_active(id, false);
            }
        });

        let state = Arc::clone(&self.state);
        let resumed = listeners.resumed.subscribe(move |id: &TimerId| {
            if let Some(mut board) = lock(&state) {
                board.set_active(id, true);
            }
        });

        let state = Arc::clone(&self.state);
        let finished = listeners.finished.subscribe(move |id: &TimerId| {
            if let Some(mut board) = lock(&state) {
                board.entries.retain(|e| &e.id != id);
            }
        });

        *subscriptions = Some(Subscriptions {
            registered,
            started,
            paused,
            resumed,
            finished,
        });
    }

    /// Stop following `listeners`; entries already on the board are kept
    pub fn detach(&self, listeners: &TimerListeners) {
        let Ok(mut subscriptions) = self.subscriptions.lock() else {
            error!("Failed to lock board subscriptions");
            return;
        };
        if let Some(subs) = subscriptions.take() {
            listeners.registered.unsubscribe(subs.registered);
            listeners.started.unsubscribe(subs.started);
            listeners.paused.unsubscribe(subs.paused);
            listeners.resumed.unsubscribe(subs.resumed);
            listeners.finished.unsubscribe(subs.finished);
        }
    }

    pub fn entries(&self) -> Vec<BoardEntry> {
        lock(&self.state)
            .map(|board| board.entries.clone())
            .unwrap_or_default()
    }
}

impl Default for CountdownBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replication::events::TimerEvent;

    fn feed(listeners: &TimerListeners, events: &[TimerEvent]) {
        for event in events {
            listeners.dispatch(event);
        }
    }

    #[test]
    fn board_tracks_lifecycle() {
        let listeners = TimerListeners::new();
        let board = CountdownBoard::new();
        board.attach(&listeners);

        feed(
            &listeners,
            &[
                TimerEvent::Registered {
                    id: "a".into(),
                    duration: 10.0,
                },
                TimerEvent::Registered {
                    id: "b".into(),
                    duration: 5.0,
                },
                TimerEvent::Started {
                    id: "a".into(),
                    duration: 10.0,
                },
            ],
        );
        assert_eq!(
            board.entries(),
            vec![
                BoardEntry {
                    id: "a".into(),
                    duration: 10.0,
                    active: true,
                },
                BoardEntry {
                    id: "b".into(),
                    duration: 5.0,
                    active: false,
                },
            ]
        );

        feed(
            &listeners,
            &[
                TimerEvent::Paused { id: "a".into() },
                TimerEvent::Finished { id: "b".into() },
            ],
        );
        assert_eq!(
            board.entries(),
            vec![BoardEntry {
                id: "a".into(),
                duration: 10.0,
                active: false,
            }]
        );

        feed(&listeners, &[TimerEvent::Resumed { id: "a".into() }]);
        assert!(board.entries()[0].active);
    }

    #[test]
    fn filtered_board_ignores_other_timers() {
        let listeners = TimerListeners::new();
        let board = CountdownBoard::with_filter(Some("a".into()));
        board.attach(&listeners);

        feed(
            &listeners,
            &[
                TimerEvent::Registered {
                    id: "a".into(),
                    duration: 10.0,
                },
                TimerEvent::Registered {
                    id: "b".into(),
                    duration: 5.0,
                },
                TimerEvent::Started {
                    id: "b".into(),
                    duration: 5.0,
                },
            ],
        );

        assert_eq!(
            board.entries(),
            vec![BoardEntry {
                id: "a".into(),
                duration: 10.0,
                active: false,
            }]
        );
    }

    #[test]
    fn detached_board_stops_updating() {
        let listeners = TimerListeners::new();
        let board = CountdownBoard::new();
        board.attach(&listeners);
        board.attach(&listeners);
        assert_eq!(listeners.registered.len(), 1);

        board.detach(&listeners);
        assert!(listeners.finished.is_empty());

        feed(
            &listeners,
            &[TimerEvent::Registered {
                id: "a".into(),
                duration: 1.0,
            }],
        );
        assert!(board.entries().is_empty());
    }
}
