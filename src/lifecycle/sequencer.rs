//! Fleet shutdown sequencing.
//!
//! # Entry Points
//! ```text
//! graceful(idle)                  crash(backend, unreachable)
//!     │                               │
//!     │                               ├─ compose crash notice
//!     │                               ├─ disconnect every session with it
//!     ▼                               ▼
//! RoutingLayer::shutdown()  →  local Shutdown::trigger()
//! ```
//!
//! # Design Decisions
//! - The first entry wins; SHUTTING_DOWN is terminal
//! - Sessions are notified before the proxy is told to stop

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::backend::BackendId;
use crate::config::NoticeConfig;
use crate::lifecycle::notice::crash_notice;
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::metrics;
use crate::routing::RoutingLayer;

/// Why the fleet is going down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// No activity for `idle` with nobody connected.
    Idle { idle: Duration },
    /// `backend` failed every poll for `unreachable`.
    BackendUnreachable {
        backend: BackendId,
        unreachable: Duration,
    },
}

impl ShutdownReason {
    pub fn label(&self) -> &'static str {
        match self {
            ShutdownReason::Idle { .. } => "idle",
            ShutdownReason::BackendUnreachable { .. } => "backend_unreachable",
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Idle { idle } => write!(f, "no activity for {}s", idle.as_secs()),
            ShutdownReason::BackendUnreachable {
                backend,
                unreachable,
            } => write!(
                f,
                "backend {} unreachable for {}s",
                backend,
                unreachable.as_secs()
            ),
        }
    }
}

/// Runs the shutdown paths against the routing layer.
pub struct ShutdownSequencer {
    routing: Arc<dyn RoutingLayer>,
    shutdown: Shutdown,
    notice: NoticeConfig,
    reason: OnceLock<ShutdownReason>,
}

impl ShutdownSequencer {
    pub fn new(routing: Arc<dyn RoutingLayer>, shutdown: Shutdown, notice: NoticeConfig) -> Self {
        Self {
            routing,
            shutdown,
            notice,
            reason: OnceLock::new(),
        }
    }

    /// Idle path: nobody is connected, so nobody is notified.
    ///
    /// Returns `false` if the fleet was already shutting down.
    pub fn graceful(&self, idle: Duration) -> bool {
        if !self.enter(ShutdownReason::Idle { idle }) {
            return false;
        }
        tracing::info!(idle_secs = idle.as_secs(), "No activity for {}s, shutting down proxy", idle.as_secs());
        self.finish();
        true
    }

    /// Crash path: tell every connected session which backend failed, then
    /// shut down.
    ///
    /// Returns `false` if the fleet was already shutting down.
    pub fn crash(&self, backend: &BackendId, unreachable: Duration) -> bool {
        let reason = ShutdownReason::BackendUnreachable {
            backend: backend.clone(),
            unreachable,
        };
        if !self.enter(reason) {
            return false;
        }
        tracing::info!(
            backend = %backend,
            unreachable_secs = unreachable.as_secs(),
            "Server {} unreachable for {}s, shutting down proxy",
            backend,
            unreachable.as_secs()
        );

        let notice = crash_notice(backend, self.notice.locale, self.notice.retry_after());
        let sessions = self.routing.sessions();
        tracing::debug!(sessions = sessions.len(), "Disconnecting sessions");
        if sessions.is_empty() {
            tracing::warn!(notice = %notice.to_plain(), "No sessions to notify");
        }
        for session in sessions {
            tracing::debug!(session = %session.name(), "Disconnecting session");
            session.disconnect(&notice);
        }

        self.finish();
        true
    }

    /// Whether either path has already fired.
    pub fn is_shutting_down(&self) -> bool {
        self.reason.get().is_some()
    }

    pub fn reason(&self) -> Option<&ShutdownReason> {
        self.reason.get()
    }

    fn enter(&self, reason: ShutdownReason) -> bool {
        let label = reason.label();
        match self.reason.set(reason) {
            Ok(()) => {
                metrics::record_shutdown(label);
                true
            }
            Err(ignored) => {
                tracing::debug!(ignored = %ignored, "Shutdown already in progress, ignoring additional request");
                false
            }
        }
    }

    fn finish(&self) {
        self.routing.shutdown();
        self.shutdown.trigger();
    }
}
