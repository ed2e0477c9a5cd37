//! Timer state module
//!
//! Timer records, the published snapshot, and the authoritative store that
//! owns them.

pub mod app_state;
pub mod snapshot;
pub mod timer_record;
pub mod timer_store;

// Re-export main types
pub use app_state::AppState;
pub use snapshot::Snapshot;
pub use timer_record::{TimerId, TimerPhase, TimerRecord};
pub use timer_store::{TimerSpec, TimerStore};
