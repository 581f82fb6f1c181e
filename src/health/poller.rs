//! Backend polling.
//!
//! # Responsibilities
//! - Periodically ping every registered backend
//! - Record successful contact in the health tracker
//! - Count players on a backend as fleet activity
//! - Escalate to a fleet shutdown when a backend stays unreachable

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::time;

use crate::activity::{ActivityKind, ActivityRegister};
use crate::backend::{BackendId, BackendRegistry, PollOutcome, ProbeError};
use crate::clock::Clock;
use crate::config::PollingConfig;
use crate::health::tracker::HealthTracker;
use crate::lifecycle::{Shutdown, ShutdownSequencer};
use crate::observability::metrics;

/// What a single poll result led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollVerdict {
    /// Reachable with players online; fleet activity recorded.
    Active { online: u32 },
    /// Reachable and empty; only liveness recorded.
    Alive,
    /// Unreachable, still below the threshold.
    Unreachable(Duration),
    /// Unreachable beyond the threshold; crash shutdown started.
    Escalated(Duration),
    /// The fleet is already shutting down.
    Skipped,
}

pub struct BackendPoller {
    registry: Arc<dyn BackendRegistry>,
    clock: Arc<dyn Clock>,
    activity: Arc<ActivityRegister>,
    health: HealthTracker,
    sequencer: Arc<ShutdownSequencer>,
    interval: Duration,
    unreachable_threshold: Duration,
}

impl BackendPoller {
    pub fn new(
        registry: Arc<dyn BackendRegistry>,
        clock: Arc<dyn Clock>,
        activity: Arc<ActivityRegister>,
        health: HealthTracker,
        sequencer: Arc<ShutdownSequencer>,
        config: &PollingConfig,
    ) -> Self {
        Self {
            registry,
            clock,
            activity,
            health,
            sequencer,
            interval: config.interval(),
            unreachable_threshold: config.unreachable_threshold(),
        }
    }

    pub async fn run(self: Arc<Self>, shutdown: Shutdown) {
        let mut shutdown_rx = shutdown.subscribe();

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            unreachable_threshold_secs = self.unreachable_threshold.as_secs(),
            "Backend poller starting"
        );

        let mut ticker = time::interval(self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if shutdown.is_triggered() || self.sequencer.is_shutting_down() {
                        break;
                    }
                    // A panicking registry or ping constructor must not end the schedule.
                    if panic::catch_unwind(AssertUnwindSafe(|| self.poll_all())).is_err() {
                        tracing::error!("Backend poll cycle panicked, continuing with next tick");
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Backend poller received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Start one ping per registered backend without waiting for any of them.
    ///
    /// Returns the number of pings started.
    pub fn poll_all(self: &Arc<Self>) -> usize {
        let backends = self.registry.backends();
        tracing::trace!(count = backends.len(), "Polling backends");

        for backend in &backends {
            let poller = Arc::clone(self);
            let backend = Arc::clone(backend);
            let ping = backend.ping();

            tokio::spawn(async move {
                let outcome = match AssertUnwindSafe(ping).catch_unwind().await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        tracing::error!(backend = %backend.id(), "Backend ping panicked");
                        PollOutcome::Failure(ProbeError::Protocol("ping panicked".into()))
                    }
                };
                poller.handle_outcome(backend.id(), outcome);
            });
        }

        backends.len()
    }

    /// Apply one ping result.
    pub fn handle_outcome(&self, backend: &BackendId, outcome: PollOutcome) -> PollVerdict {
        if self.sequencer.is_shutting_down() {
            return PollVerdict::Skipped;
        }

        let now = self.clock.now();
        metrics::record_backend_poll(backend, outcome.is_success());

        match outcome {
            PollOutcome::Success { online } => {
                self.health.record_contact(backend, now);
                metrics::record_backend_players(backend, online);

                if online > 0 {
                    self.activity.record_activity(now);
                    metrics::record_activity(ActivityKind::BackendPlayers);
                    tracing::debug!(
                        backend = %backend,
                        online,
                        "Backend '{}' has {} players, resetting idle timer",
                        backend,
                        online
                    );
                    PollVerdict::Active { online }
                } else {
                    tracing::trace!(backend = %backend, "Backend alive, no players");
                    PollVerdict::Alive
                }
            }
            PollOutcome::Failure(e) => {
                let unreachable = self.health.unreachable_for(backend, now);
                metrics::record_backend_unreachable(backend, unreachable);
                tracing::warn!(
                    backend = %backend,
                    error = %e,
                    unreachable_secs = unreachable.as_secs(),
                    "Failed to ping backend"
                );

                if unreachable < self.unreachable_threshold {
                    return PollVerdict::Unreachable(unreachable);
                }
                if self.sequencer.crash(backend, unreachable) {
                    PollVerdict::Escalated(unreachable)
                } else {
                    PollVerdict::Skipped
                }
            }
        }
    }

    pub fn health(&self) -> &HealthTracker {
        &self.health
    }
}
