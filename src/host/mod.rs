//! Host collaborator
//!
//! The timer store needs exactly three things from whatever owns it: a clock,
//! a role query, and a way to run a callback once after a delay.

pub mod manual;
pub mod tokio_host;

use serde::{Deserialize, Serialize};

pub use manual::ManualHost;
pub use tokio_host::TokioHost;

/// Boxed one-shot callback handed to [`Host::schedule_once`]
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Network role of the process hosting a timer store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The single writer; may mutate timers
    Authority,
    /// Read-only consumer of published snapshots
    Observer,
}

impl Role {
    pub fn is_authority(self) -> bool {
        matches!(self, Role::Authority)
    }
}

/// Capabilities a timer store consumes from its host
pub trait Host: Send + Sync {
    /// Current host time in seconds. Must be strictly positive once the host
    /// is live, since a start time of zero means "never started".
    fn now(&self) -> f64;

    /// Role of this process
    fn role(&self) -> Role;

    /// Run `callback` once, `delay_secs` seconds from now
    fn schedule_once(&self, delay_secs: f64, callback: Callback);
}
