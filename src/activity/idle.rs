//! Idle checking.
//!
//! # Responsibilities
//! - Every tick, treat sessions on the proxy as activity
//! - Otherwise measure the silence and shut the fleet down past the threshold

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::time;

use crate::activity::{ActivityKind, ActivityRegister};
use crate::clock::Clock;
use crate::config::IdleConfig;
use crate::lifecycle::{Shutdown, ShutdownSequencer};
use crate::observability::metrics;
use crate::routing::RoutingLayer;

/// Result of one idle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleVerdict {
    /// Sessions are connected to the proxy; the timer was reset.
    Occupied(usize),
    /// Silent, but below the threshold.
    Idle(Duration),
    /// Silent past the threshold; graceful shutdown started.
    Expired(Duration),
}

pub struct IdleChecker {
    routing: Arc<dyn RoutingLayer>,
    clock: Arc<dyn Clock>,
    activity: Arc<ActivityRegister>,
    sequencer: Arc<ShutdownSequencer>,
    threshold: Duration,
    check_interval: Duration,
}

impl IdleChecker {
    pub fn new(
        routing: Arc<dyn RoutingLayer>,
        clock: Arc<dyn Clock>,
        activity: Arc<ActivityRegister>,
        sequencer: Arc<ShutdownSequencer>,
        config: &IdleConfig,
    ) -> Self {
        Self {
            routing,
            clock,
            activity,
            sequencer,
            threshold: config.threshold(),
            check_interval: config.check_interval(),
        }
    }

    pub async fn run(self: Arc<Self>, shutdown: Shutdown) {
        let mut shutdown_rx = shutdown.subscribe();

        tracing::info!(
            threshold_secs = self.threshold.as_secs(),
            check_interval_ms = self.check_interval.as_millis() as u64,
            "Idle checker starting"
        );

        let mut ticker = time::interval(self.check_interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if shutdown.is_triggered() || self.sequencer.is_shutting_down() {
                        break;
                    }
                    // A panicking occupancy query must not end the schedule.
                    if panic::catch_unwind(AssertUnwindSafe(|| self.check())).is_err() {
                        tracing::error!("Idle check panicked, continuing with next tick");
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Idle checker received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run one check at the clock's current time.
    pub fn check(&self) -> IdleVerdict {
        let now = self.clock.now();

        let online = self.routing.connected_sessions();
        if online > 0 {
            self.activity.record_activity(now);
            metrics::record_activity(ActivityKind::ProxySessions);
            metrics::record_idle(Duration::ZERO);
            return IdleVerdict::Occupied(online);
        }

        let idle = self.activity.elapsed_since(now);
        metrics::record_idle(idle);

        if idle >= self.threshold {
            self.sequencer.graceful(idle);
            IdleVerdict::Expired(idle)
        } else {
            tracing::trace!(idle_secs = idle.as_secs(), "Proxy idle");
            IdleVerdict::Idle(idle)
        }
    }
}
