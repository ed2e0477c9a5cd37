//! Snapshot diffing into lifecycle events
//!
//! A peer only ever sees coarse snapshots, so it can observe at most one
//! transition per timer per snapshot. Changes that happen between two
//! snapshots collapse: a pause followed by a resume before the peer looks is
//! invisible, and a start followed by a pause reports only `Started`.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::events::TimerEvent;
use crate::state::{Snapshot, TimerId, TimerRecord};

/// Derive the transitions from `baseline` to `incoming`.
///
/// Events for timers present in `incoming` come first, in snapshot order;
/// `Finished` events for vanished timers follow, in baseline order.
pub fn diff(baseline: &Snapshot, incoming: &Snapshot) -> Vec<TimerEvent> {
    let previous: HashMap<&TimerId, &TimerRecord> =
        baseline.iter().map(|t| (&t.id, t)).collect();

    let mut events: Vec<TimerEvent> = incoming
        .iter()
        .filter_map(|new| match previous.get(&new.id) {
            None => Some(TimerEvent::Registered {
                id: new.id.clone(),
                duration: new.duration,
            }),
            Some(old) => transition(old, new),
        })
        .collect();

    let current: HashSet<&TimerId> = incoming.iter().map(|t| &t.id).collect();
    events.extend(
        baseline
            .iter()
            .filter(|old| !current.contains(&old.id))
            .map(|old| TimerEvent::Finished { id: old.id.clone() }),
    );

    events
}

/// At most one event per surviving timer, in fixed precedence
fn transition(old: &TimerRecord, new: &TimerRecord) -> Option<TimerEvent> {
    if new.is_started() && !old.is_started() {
        Some(TimerEvent::Started {
            id: new.id.clone(),
            duration: new.duration,
        })
    } else if new.is_paused && !old.is_paused {
        Some(TimerEvent::Paused { id: new.id.clone() })
    } else if !new.is_paused && old.is_paused {
        Some(TimerEvent::Resumed { id: new.id.clone() })
    } else {
        None
    }
}

/// Per-peer diff state: the last snapshot this peer processed
#[derive(Debug, Default)]
pub struct DiffEngine {
    baseline: Snapshot,
}

impl DiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn baseline(&self) -> &Snapshot {
        &self.baseline
    }

    /// Diff `incoming` against the baseline, then adopt it as the new baseline
    pub fn apply(&mut self, incoming: &Snapshot) -> Vec<TimerEvent> {
        let events = diff(&self.baseline, incoming);
        debug!(
            "Diffed revision {} -> {}: {} event(s)",
            self.baseline.revision,
            incoming.revision,
            events.len()
        );
        self.baseline = incoming.clone();
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer(id: &str, duration: f64, start_time: f64, is_paused: bool) -> TimerRecord {
        TimerRecord {
            id: id.into(),
            duration,
            start_time,
            is_paused,
            elapsed_when_paused: 0.0,
        }
    }

    fn snap(timers: Vec<TimerRecord>) -> Snapshot {
        Snapshot::new(0, timers)
    }

    #[test]
    fn new_timer_is_registered() {
        let events = diff(&snap(vec![]), &snap(vec![timer("A", 10.0, 0.0, false)]));
        assert_eq!(
            events,
            vec![TimerEvent::Registered {
                id: "A".into(),
                duration: 10.0,
            }]
        );
    }

    #[test]
    fn start_is_reported_without_registration() {
        let events = diff(
            &snap(vec![timer("A", 10.0, 0.0, false)]),
            &snap(vec![timer("A", 10.0, 5.0, false)]),
        );
        assert_eq!(
            events,
            vec![TimerEvent::Started {
                id: "A".into(),
                duration: 10.0,
            }]
        );
    }

    #[test]
    fn vanished_timer_is_finished() {
        let events = diff(&snap(vec![timer("A", 10.0, 5.0, false)]), &snap(vec![]));
        assert_eq!(events, vec![TimerEvent::Finished { id: "A".into() }]);
    }

    #[test]
    fn pause_and_resume_are_reported() {
        let running = timer("A", 10.0, 5.0, false);
        let paused = timer("A", 10.0, 5.0, true);

        assert_eq!(
            diff(&snap(vec![running.clone()]), &snap(vec![paused.clone()])),
            vec![TimerEvent::Paused { id: "A".into() }]
        );
        assert_eq!(
            diff(&snap(vec![paused]), &snap(vec![running])),
            vec![TimerEvent::Resumed { id: "A".into() }]
        );
    }

    #[test]
    fn start_takes_precedence_over_pause() {
        let events = diff(
            &snap(vec![timer("A", 10.0, 0.0, false)]),
            &snap(vec![timer("A", 10.0, 5.0, true)]),
        );
        assert_eq!(
            events,
            vec![TimerEvent::Started {
                id: "A".into(),
                duration: 10.0,
            }]
        );
    }

    #[test]
    fn unchanged_snapshot_emits_nothing() {
        let both = snap(vec![timer("A", 10.0, 5.0, false), timer("B", 3.0, 0.0, false)]);
        assert!(diff(&both, &both).is_empty());
    }

    #[test]
    fn mixed_changes_keep_snapshot_then_baseline_order() {
        let baseline = snap(vec![
            timer("gone", 1.0, 2.0, false),
            timer("run", 10.0, 0.0, false),
            timer("also-gone", 1.0, 0.0, false),
        ]);
        let incoming = snap(vec![timer("run", 10.0, 7.0, false), timer("new", 4.0, 0.0, false)]);

        assert_eq!(
            diff(&baseline, &incoming),
            vec![
                TimerEvent::Started {
                    id: "run".into(),
                    duration: 10.0,
                },
                TimerEvent::Registered {
                    id: "new".into(),
                    duration: 4.0,
                },
                TimerEvent::Finished { id: "gone".into() },
                TimerEvent::Finished {
                    id: "also-gone".into(),
                },
            ]
        );
    }

    #[test]
    fn engine_commits_baseline_after_each_pass() {
        let mut engine = DiffEngine::new();
        let first = Snapshot::new(1, vec![timer("A", 10.0, 0.0, false)]);

        assert_eq!(engine.apply(&first).len(), 1);
        assert_eq!(engine.baseline(), &first);
        assert!(engine.apply(&first).is_empty());

        let second = Snapshot::new(2, vec![]);
        assert_eq!(
            engine.apply(&second),
            vec![TimerEvent::Finished { id: "A".into() }]
        );
        assert!(engine.baseline().is_empty());
    }
}
