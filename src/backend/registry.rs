//! Fixed backend registry.
//!
//! # Responsibilities
//! - Hold the backends known at startup
//! - Build status-protocol backends from the sidecar configuration

use std::sync::Arc;
use std::time::Duration;

use crate::backend::{BackendRegistry, BackendServer, SlpBackend};
use crate::config::ServerConfig;

/// A registry whose membership never changes.
#[derive(Clone, Default)]
pub struct StaticRegistry {
    backends: Vec<Arc<dyn BackendServer>>,
}

impl StaticRegistry {
    pub fn new(backends: Vec<Arc<dyn BackendServer>>) -> Self {
        Self { backends }
    }

    /// Create one status-protocol backend per configured server.
    pub fn from_config(servers: &[ServerConfig], probe_timeout: Duration) -> Self {
        let backends = servers
            .iter()
            .map(|server| {
                tracing::debug!(name = %server.name, address = %server.address, "Registering backend");
                Arc::new(SlpBackend::new(
                    server.name.as_str(),
                    server.address.clone(),
                    probe_timeout,
                )) as Arc<dyn BackendServer>
            })
            .collect();
        Self { backends }
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl BackendRegistry for StaticRegistry {
    fn backends(&self) -> Vec<Arc<dyn BackendServer>> {
        self.backends.clone()
    }
}
