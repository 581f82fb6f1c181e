//! Metrics collection and exposition.
//!
//! # Metrics
//! - `autoshutdown_activity_total` (counter): activity signals by kind
//! - `autoshutdown_idle_seconds` (gauge): silence observed at the last idle check
//! - `autoshutdown_backend_polls_total` (counter): poll results by backend, result
//! - `autoshutdown_backend_players` (gauge): players reported by each backend
//! - `autoshutdown_backend_unreachable_seconds` (gauge): time since last contact on failure
//! - `autoshutdown_shutdowns_total` (counter): shutdowns by reason

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::activity::ActivityKind;
use crate::backend::BackendId;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_activity(kind: ActivityKind) {
    counter!("autoshutdown_activity_total", "kind" => kind.as_str()).increment(1);
}

pub fn record_idle(idle: Duration) {
    gauge!("autoshutdown_idle_seconds").set(idle.as_secs_f64());
}

pub fn record_backend_poll(backend: &BackendId, success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!(
        "autoshutdown_backend_polls_total",
        "backend" => backend.to_string(),
        "result" => result
    )
    .increment(1);
}

pub fn record_backend_players(backend: &BackendId, online: u32) {
    gauge!("autoshutdown_backend_players", "backend" => backend.to_string()).set(f64::from(online));
}

pub fn record_backend_unreachable(backend: &BackendId, unreachable: Duration) {
    gauge!("autoshutdown_backend_unreachable_seconds", "backend" => backend.to_string())
        .set(unreachable.as_secs_f64());
}

pub fn record_shutdown(reason: &'static str) {
    counter!("autoshutdown_shutdowns_total", "reason" => reason).increment(1);
}
