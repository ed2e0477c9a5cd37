//! Replication module
//!
//! Turns published snapshots into lifecycle events on each peer.

pub mod board;
pub mod diff;
pub mod events;
pub mod listeners;
pub mod peer;

// Re-export main types
pub use board::{BoardEntry, CountdownBoard};
pub use diff::{diff, DiffEngine};
pub use events::{TimerEvent, TimerSpan};
pub use listeners::{Multicast, SubscriptionId, TimerListeners};
pub use peer::Peer;
