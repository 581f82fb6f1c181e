//! Per-backend last-contact bookkeeping.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use crate::backend::BackendId;
use crate::clock::to_millis;

/// Last successful contact per backend, in milliseconds since the clock epoch.
///
/// Written from concurrent ping completions; readers tolerate slightly stale
/// entries. Records are never removed.
#[derive(Debug, Clone, Default)]
pub struct HealthTracker {
    last_contact: Arc<DashMap<BackendId, u64>>,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful contact at `now`.
    pub fn record_contact(&self, backend: &BackendId, now: Duration) {
        let now_ms = to_millis(now);
        self.last_contact
            .entry(backend.clone())
            .and_modify(|last| *last = (*last).max(now_ms))
            .or_insert(now_ms);
    }

    /// Last successful contact, `None` if never contacted.
    pub fn last_contact(&self, backend: &BackendId) -> Option<Duration> {
        self.last_contact
            .get(backend)
            .map(|r| Duration::from_millis(*r.value()))
    }

    /// Time since last contact, counting from the epoch if never contacted.
    pub fn unreachable_for(&self, backend: &BackendId, now: Duration) -> Duration {
        now.saturating_sub(self.last_contact(backend).unwrap_or(Duration::ZERO))
    }

    /// Number of backends contacted at least once.
    pub fn len(&self) -> usize {
        self.last_contact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_contact.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_contacted_counts_from_epoch() {
        let tracker = HealthTracker::new();
        let id = BackendId::new("survival");

        assert!(tracker.last_contact(&id).is_none());
        assert_eq!(tracker.unreachable_for(&id, Duration::from_secs(30)), Duration::from_secs(30));
    }

    #[test]
    fn test_contact_resets_unreachable_duration() {
        let tracker = HealthTracker::new();
        let id = BackendId::new("lobby");

        tracker.record_contact(&id, Duration::from_secs(100));
        assert_eq!(tracker.unreachable_for(&id, Duration::from_secs(112)), Duration::from_secs(12));
        assert_eq!(tracker.unreachable_for(&id, Duration::from_secs(140)), Duration::from_secs(40));

        tracker.record_contact(&id, Duration::from_secs(150));
        assert_eq!(tracker.unreachable_for(&id, Duration::from_secs(150)), Duration::ZERO);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_late_completion_does_not_rewind() {
        let tracker = HealthTracker::new();
        let id = BackendId::new("lobby");

        tracker.record_contact(&id, Duration::from_secs(20));
        // A slow ping from an earlier cycle completing after a newer one.
        tracker.record_contact(&id, Duration::from_secs(10));
        assert_eq!(tracker.last_contact(&id), Some(Duration::from_secs(20)));
    }

    #[test]
    fn test_backends_are_independent() {
        let tracker = HealthTracker::new();
        let a = BackendId::new("a");
        let b = BackendId::new("b");

        tracker.record_contact(&a, Duration::from_secs(50));
        assert_eq!(tracker.unreachable_for(&a, Duration::from_secs(60)), Duration::from_secs(10));
        assert_eq!(tracker.unreachable_for(&b, Duration::from_secs(60)), Duration::from_secs(60));
    }
}
