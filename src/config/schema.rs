//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! controller. All types derive Serde traits for deserialization from
//! config files, and every field has a default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::lifecycle::notice::Locale;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AutoShutdownConfig {
    /// Idle threshold and check cadence.
    pub idle: IdleConfig,

    /// Backend polling and unreachability escalation.
    pub polling: PollingConfig,

    /// Crash notice wording.
    pub notice: NoticeConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,

    /// Standalone mode next to an unmodified proxy.
    pub sidecar: SidecarConfig,
}

/// Idle shutdown settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdleConfig {
    /// Seconds of silence before the fleet shuts down.
    pub threshold_secs: u64,

    /// Seconds between idle checks.
    pub check_interval_secs: u64,
}

impl IdleConfig {
    pub fn threshold(&self) -> Duration {
        Duration::from_secs(self.threshold_secs)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            threshold_secs: 90,
            check_interval_secs: 1,
        }
    }
}

/// Backend polling settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Seconds between backend poll cycles.
    pub interval_secs: u64,

    /// Seconds a backend may fail every poll before the fleet restarts.
    pub unreachable_threshold_secs: u64,
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn unreachable_threshold(&self) -> Duration {
        Duration::from_secs(self.unreachable_threshold_secs)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            unreachable_threshold_secs: 30,
        }
    }
}

/// Crash notice settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NoticeConfig {
    /// Language of the message shown to disconnected players.
    pub locale: Locale,

    /// Minutes players are told to wait before reconnecting.
    pub retry_after_mins: u64,
}

impl NoticeConfig {
    pub fn retry_after(&self) -> Duration {
        Duration::from_secs(self.retry_after_mins.saturating_mul(60))
    }
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            retry_after_mins: 2,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Sidecar configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SidecarConfig {
    /// The proxy's player-facing listener, pinged for occupancy.
    pub proxy_address: String,

    /// Timeout for each status ping in seconds.
    pub probe_timeout_secs: u64,

    /// Program and arguments run to stop the fleet. Empty: only log.
    pub shutdown_command: Vec<String>,

    /// Backend servers behind the proxy.
    pub servers: Vec<ServerConfig>,
}

impl SidecarConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            proxy_address: "127.0.0.1:25577".to_string(),
            probe_timeout_secs: 5,
            shutdown_command: Vec::new(),
            servers: Vec::new(),
        }
    }
}

/// A backend server definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Unique backend name, shown to players in the crash notice.
    pub name: String,

    /// Status address (e.g., "127.0.0.1:25566").
    pub address: String,
}
