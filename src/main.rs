//! Fleet auto-shutdown sidecar.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────┐
//!                 │              fleet-autoshutdown              │
//!                 │                                              │
//!   proxy  ◀──────┼── status ping ── SidecarProxy (occupancy)    │
//!                 │                        │                     │
//!                 │                        ▼                     │
//!                 │   IdleChecker (1s) ─▶ ActivityRegister       │
//!                 │                        ▲                     │
//!   backends ◀────┼── status ping ── BackendPoller (10s)         │
//!                 │                        │                     │
//!                 │                        ▼                     │
//!                 │               ShutdownSequencer ─────────────┼──▶ shutdown command
//!                 └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use fleet_autoshutdown::backend::StaticRegistry;
use fleet_autoshutdown::config::{load_config, AutoShutdownConfig};
use fleet_autoshutdown::lifecycle::{signals, Shutdown};
use fleet_autoshutdown::observability::{logging, metrics};
use fleet_autoshutdown::sidecar::SidecarProxy;
use fleet_autoshutdown::{AutoShutdown, Settings};

/// How long to wait for the shutdown command before exiting anyway.
const SHUTDOWN_COMMAND_GRACE: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(name = "fleet-autoshutdown")]
#[command(about = "Shuts a proxy fleet down when it goes idle or a backend crashes", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AutoShutdownConfig::default(),
    };

    if cli.check {
        println!("configuration OK");
        return Ok(());
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!("fleet-autoshutdown v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let registry = Arc::new(StaticRegistry::from_config(
        &config.sidecar.servers,
        config.sidecar.probe_timeout(),
    ));
    let proxy = Arc::new(SidecarProxy::new(&config.sidecar));

    tracing::info!(
        proxy_address = %config.sidecar.proxy_address,
        backends = registry.len(),
        "Configuration loaded"
    );

    let controller = AutoShutdown::new(Settings::from(&config), registry, proxy.clone());
    let refresher = Shutdown::new();
    tokio::spawn(proxy.clone().run_refresh(config.idle.check_interval(), refresher.clone()));
    let tasks = controller.start();

    tokio::select! {
        _ = controller.stopped() => {
            if let Some(reason) = controller.shutdown_reason() {
                tracing::info!(reason = %reason, "Fleet shutdown triggered");
                if tokio::time::timeout(SHUTDOWN_COMMAND_GRACE, proxy.finished()).await.is_err() {
                    tracing::warn!("Shutdown command still running, exiting anyway");
                }
            }
        }
        _ = signals::terminate() => {
            tracing::info!("Stopping without shutting the fleet down");
            controller.stop();
        }
    }

    refresher.trigger();
    for task in tasks {
        if let Err(e) = task.await {
            tracing::error!(error = %e, "Background task failed");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
