//! The shared "last active" timestamp.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::clock::to_millis;

/// Most recent moment any activity was observed.
///
/// Stored as milliseconds since the clock epoch. Any number of threads may
/// write; the last store wins.
#[derive(Debug)]
pub struct ActivityRegister {
    last_active_ms: AtomicU64,
}

impl ActivityRegister {
    /// Create a register whose last activity is `start`.
    pub fn new(start: Duration) -> Self {
        Self {
            last_active_ms: AtomicU64::new(to_millis(start)),
        }
    }

    /// Overwrite the timestamp with `now`.
    pub fn record_activity(&self, now: Duration) {
        self.last_active_ms.store(to_millis(now), Ordering::Relaxed);
    }

    /// Time since the last recorded activity. Zero if `now` is behind it.
    pub fn elapsed_since(&self, now: Duration) -> Duration {
        now.saturating_sub(self.last_active())
    }

    /// The raw last-active timestamp.
    pub fn last_active(&self) -> Duration {
        Duration::from_millis(self.last_active_ms.load(Ordering::Relaxed))
    }
}
