//! The idle-shutdown controller.
//!
//! `AutoShutdown` owns the shared state (activity register, health tracker,
//! shutdown sequencer) and spawns the two periodic tasks. Hosts feed it
//! proxy events through [`AutoShutdown::record_activity`].

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::activity::{ActivityKind, ActivityRegister, IdleChecker};
use crate::backend::BackendRegistry;
use crate::clock::{Clock, MonotonicClock};
use crate::config::{IdleConfig, NoticeConfig, PollingConfig};
use crate::health::{BackendPoller, HealthTracker};
use crate::lifecycle::{Shutdown, ShutdownReason, ShutdownSequencer};
use crate::observability::metrics;
use crate::routing::RoutingLayer;

/// Engine settings, fixed for the process lifetime.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub idle: IdleConfig,
    pub polling: PollingConfig,
    pub notice: NoticeConfig,
}

impl From<&crate::config::AutoShutdownConfig> for Settings {
    fn from(config: &crate::config::AutoShutdownConfig) -> Self {
        Self {
            idle: config.idle.clone(),
            polling: config.polling.clone(),
            notice: config.notice.clone(),
        }
    }
}

pub struct AutoShutdown {
    clock: Arc<dyn Clock>,
    activity: Arc<ActivityRegister>,
    health: HealthTracker,
    sequencer: Arc<ShutdownSequencer>,
    shutdown: Shutdown,
    idle_checker: Arc<IdleChecker>,
    poller: Arc<BackendPoller>,
}

impl AutoShutdown {
    /// Create a controller measuring time from now.
    pub fn new(
        settings: Settings,
        registry: Arc<dyn BackendRegistry>,
        routing: Arc<dyn RoutingLayer>,
    ) -> Self {
        Self::with_clock(settings, registry, routing, Arc::new(MonotonicClock::new()))
    }

    pub fn with_clock(
        settings: Settings,
        registry: Arc<dyn BackendRegistry>,
        routing: Arc<dyn RoutingLayer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let shutdown = Shutdown::new();
        let activity = Arc::new(ActivityRegister::new(clock.now()));
        let health = HealthTracker::new();
        let sequencer = Arc::new(ShutdownSequencer::new(
            routing.clone(),
            shutdown.clone(),
            settings.notice.clone(),
        ));

        let idle_checker = Arc::new(IdleChecker::new(
            routing,
            clock.clone(),
            activity.clone(),
            sequencer.clone(),
            &settings.idle,
        ));
        let poller = Arc::new(BackendPoller::new(
            registry,
            clock.clone(),
            activity.clone(),
            health.clone(),
            sequencer.clone(),
            &settings.polling,
        ));

        tracing::info!(
            threshold_secs = settings.idle.threshold_secs,
            backend_poll_secs = settings.polling.interval_secs,
            unreachable_secs = settings.polling.unreachable_threshold_secs,
            "AutoShutdown: threshold={}s, backend-poll={}s",
            settings.idle.threshold_secs,
            settings.polling.interval_secs
        );

        Self {
            clock,
            activity,
            health,
            sequencer,
            shutdown,
            idle_checker,
            poller,
        }
    }

    /// Spawn the idle checker and the backend poller on the current runtime.
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        vec![
            tokio::spawn(self.idle_checker.clone().run(self.shutdown.clone())),
            tokio::spawn(self.poller.clone().run(self.shutdown.clone())),
        ]
    }

    /// Note an activity signal from the proxy.
    pub fn record_activity(&self, kind: ActivityKind) {
        self.activity.record_activity(self.clock.now());
        metrics::record_activity(kind);
        tracing::debug!(kind = %kind, "Activity [{}], resetting idle timer", kind);
    }

    /// Stop the periodic tasks without shutting the fleet down.
    pub fn stop(&self) {
        self.shutdown.trigger();
    }

    /// Resolves once the tasks have been told to stop, by `stop` or by a
    /// fleet shutdown.
    pub async fn stopped(&self) {
        self.shutdown.wait().await
    }

    pub fn shutdown_reason(&self) -> Option<ShutdownReason> {
        self.sequencer.reason().cloned()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.sequencer.is_shutting_down()
    }

    pub fn activity(&self) -> &ActivityRegister {
        &self.activity
    }

    pub fn health(&self) -> &HealthTracker {
        &self.health
    }

    pub fn idle_checker(&self) -> &IdleChecker {
        &self.idle_checker
    }

    pub fn poller(&self) -> &Arc<BackendPoller> {
        &self.poller
    }
}
