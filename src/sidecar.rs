//! Standalone mode next to an unmodified proxy.
//!
//! # Responsibilities
//! - Track proxy occupancy by pinging the proxy's own listener
//! - Run the configured shutdown command when the fleet must stop
//!
//! A sidecar sees neither handshakes nor sessions, so the crash notice is
//! only logged and idle time is driven by occupancy and backend players.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;
use tokio::time;

use crate::backend::slp::query_players;
use crate::backend::ProbeError;
use crate::config::SidecarConfig;
use crate::lifecycle::Shutdown;
use crate::routing::{RoutingLayer, Session};

pub struct SidecarProxy {
    address: String,
    probe_timeout: Duration,
    shutdown_command: Vec<String>,
    online: AtomicUsize,
    stopping: AtomicBool,
    finished: Shutdown,
}

impl SidecarProxy {
    pub fn new(config: &SidecarConfig) -> Self {
        Self {
            address: config.proxy_address.clone(),
            probe_timeout: config.probe_timeout(),
            shutdown_command: config.shutdown_command.clone(),
            online: AtomicUsize::new(0),
            stopping: AtomicBool::new(false),
            finished: Shutdown::new(),
        }
    }

    /// Ping the proxy once and cache its player count.
    pub async fn refresh(&self) -> Result<usize, ProbeError> {
        let online = query_players(&self.address, self.probe_timeout).await? as usize;
        self.online.store(online, Ordering::Relaxed);
        Ok(online)
    }

    /// Keep the cached count fresh until `shutdown` fires.
    pub async fn run_refresh(self: Arc<Self>, interval: Duration, shutdown: Shutdown) {
        let mut shutdown_rx = shutdown.subscribe();
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if shutdown.is_triggered() {
                        break;
                    }
                    if let Err(e) = self.refresh().await {
                        tracing::debug!(
                            address = %self.address,
                            error = %e,
                            "Proxy status ping failed, keeping last occupancy"
                        );
                    }
                }
                _ = shutdown_rx.recv() => break,
            }
        }
    }

    /// Resolves after the shutdown command (if any) has exited.
    pub async fn finished(&self) {
        self.finished.wait().await
    }

    fn run_shutdown_command(&self) {
        let Some((program, args)) = self.shutdown_command.split_first() else {
            tracing::warn!("No shutdown command configured, stopping without touching the fleet");
            self.finished.trigger();
            return;
        };

        tracing::info!(program = %program, args = ?args, "Running shutdown command");
        match Command::new(program).args(args).spawn() {
            Ok(mut child) => {
                let finished = self.finished.clone();
                tokio::spawn(async move {
                    match child.wait().await {
                        Ok(status) if status.success() => {
                            tracing::info!("Shutdown command finished")
                        }
                        Ok(status) => {
                            tracing::error!(status = %status, "Shutdown command failed")
                        }
                        Err(e) => tracing::error!(error = %e, "Failed to wait for shutdown command"),
                    }
                    finished.trigger();
                });
            }
            Err(e) => {
                tracing::error!(program = %program, error = %e, "Failed to spawn shutdown command");
                self.finished.trigger();
            }
        }
    }
}

impl RoutingLayer for SidecarProxy {
    fn connected_sessions(&self) -> usize {
        self.online.load(Ordering::Relaxed)
    }

    fn sessions(&self) -> Vec<Arc<dyn Session>> {
        Vec::new()
    }

    fn shutdown(&self) {
        if self.stopping.swap(true, Ordering::SeqCst) {
            return;
        }
        self.run_shutdown_command();
    }
}
