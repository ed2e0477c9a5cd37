//! Dynamic Timers - server-authoritative named timers with replicated state
//!
//! The authority owns a [`TimerStore`] and publishes a full [`Snapshot`] on
//! every change. Each peer, the authority included, diffs the snapshots it
//! receives into lifecycle events (registered, started, paused, resumed,
//! finished). Remaining time is derived from the host clock on demand, so no
//! per-tick traffic is needed.

pub mod api;
pub mod config;
pub mod error;
pub mod host;
pub mod replication;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::TimerError;
pub use host::{Host, ManualHost, Role, TokioHost};
pub use replication::{CountdownBoard, DiffEngine, Peer, TimerEvent, TimerListeners};
pub use state::{AppState, Snapshot, TimerId, TimerRecord, TimerSpec, TimerStore};
pub use utils::signals::shutdown_signal;
