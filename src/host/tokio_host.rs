//! Host backed by the tokio runtime and the system wall clock

use std::time::Duration;

use chrono::Utc;
use tokio::{runtime::Handle, time::sleep};
use tracing::debug;

use super::{Callback, Host, Role};

/// Production host: Unix wall-clock seconds and tokio-spawned one-shot sleeps
#[derive(Debug, Clone)]
pub struct TokioHost {
    role: Role,
    handle: Handle,
}

impl TokioHost {
    /// Create a host bound to the current tokio runtime.
    ///
    /// Panics if called outside a runtime context.
    pub fn new(role: Role) -> Self {
        Self::with_handle(role, Handle::current())
    }

    /// Create a host that schedules callbacks on an explicit runtime handle
    pub fn with_handle(role: Role, handle: Handle) -> Self {
        Self { role, handle }
    }
}

impl Host for TokioHost {
    fn now(&self) -> f64 {
        Utc::now().timestamp_micros() as f64 / 1_000_000.0
    }

    fn role(&self) -> Role {
        self.role
    }

    fn schedule_once(&self, delay_secs: f64, callback: Callback) {
        // Delays beyond what a Duration can hold sleep for as long as tokio allows
        let delay = if delay_secs > 0.0 {
            Duration::try_from_secs_f64(delay_secs).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };
        debug!("Scheduling one-shot callback in {:?}", delay);

        self.handle.spawn(async move {
            sleep(delay).await;
            callback();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use crate::state::TimerStore;

    #[tokio::test]
    async fn clock_is_positive_unix_time() {
        let host = TokioHost::new(Role::Authority);
        // Anything after 2001-09-09 has a ten-digit Unix timestamp
        assert!(host.now() > 1_000_000_000.0);
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_callback_fires_after_delay() {
        let host = TokioHost::new(Role::Authority);
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);

        host.schedule_once(5.0, Box::new(move || flag.store(true, Ordering::SeqCst)));

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(!fired.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn oversized_delay_does_not_panic() {
        let host = TokioHost::new(Role::Authority);
        host.schedule_once(1e20, Box::new(|| {}));
        host.schedule_once(f64::INFINITY, Box::new(|| {}));
    }

    #[tokio::test]
    async fn store_survives_starting_huge_timer() {
        let store = TimerStore::new(Arc::new(TokioHost::new(Role::Authority)));
        store.try_register("huge", 1e20).unwrap();
        store.try_start("huge").unwrap();

        assert_eq!(store.try_register("next", 5.0), Ok(()));
        assert_eq!(store.try_pause("huge"), Ok(()));
        assert_eq!(store.try_resume("huge"), Ok(()));
        assert!(store.remaining_time(&"huge".into()).is_some());
    }
}
