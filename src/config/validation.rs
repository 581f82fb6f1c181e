//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (durations > 0, ports valid)
//! - Detect duplicate backend names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AutoShutdownConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::AutoShutdownConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("polling.unreachable_threshold_secs ({threshold}s) is shorter than polling.interval_secs ({interval}s)")]
    ThresholdBelowInterval { threshold: u64, interval: u64 },

    #[error("server #{0} has an empty name")]
    EmptyName(usize),

    #[error("duplicate server name {0:?}")]
    DuplicateName(String),

    #[error("{field}: {value:?} is not a host:port address")]
    BadAddress { field: String, value: String },

    #[error("sidecar.shutdown_command has an empty program")]
    EmptyCommand,
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &AutoShutdownConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let positive = [
        ("idle.threshold_secs", config.idle.threshold_secs),
        ("idle.check_interval_secs", config.idle.check_interval_secs),
        ("polling.interval_secs", config.polling.interval_secs),
        ("polling.unreachable_threshold_secs", config.polling.unreachable_threshold_secs),
        ("notice.retry_after_mins", config.notice.retry_after_mins),
        ("sidecar.probe_timeout_secs", config.sidecar.probe_timeout_secs),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    let polling = &config.polling;
    if polling.unreachable_threshold_secs > 0
        && polling.unreachable_threshold_secs < polling.interval_secs
    {
        errors.push(ValidationError::ThresholdBelowInterval {
            threshold: polling.unreachable_threshold_secs,
            interval: polling.interval_secs,
        });
    }

    if !is_host_port(&config.sidecar.proxy_address) {
        errors.push(ValidationError::BadAddress {
            field: "sidecar.proxy_address".into(),
            value: config.sidecar.proxy_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::BadAddress {
            field: "observability.metrics_address".into(),
            value: config.observability.metrics_address.clone(),
        });
    }

    if let Some(program) = config.sidecar.shutdown_command.first() {
        if program.trim().is_empty() {
            errors.push(ValidationError::EmptyCommand);
        }
    }

    let mut names = HashSet::new();
    for (i, server) in config.sidecar.servers.iter().enumerate() {
        if server.name.trim().is_empty() {
            errors.push(ValidationError::EmptyName(i));
        } else if !names.insert(server.name.as_str()) {
            errors.push(ValidationError::DuplicateName(server.name.clone()));
        }
        if !is_host_port(&server.address) {
            errors.push(ValidationError::BadAddress {
                field: format!("sidecar.servers[{i}].address"),
                value: server.address.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_host_port(address: &str) -> bool {
    match address.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}
