//! Backend abstraction.
//!
//! # Data Flow
//! ```text
//! BackendRegistry (registry.rs)
//!     → enumerate Arc<dyn BackendServer>
//!     → ping() → PollOutcome
//!         - Success { online }
//!         - Failure(ProbeError)
//!
//! slp.rs: BackendServer over the game's status protocol (sidecar mode)
//! ```
//!
//! # Design Decisions
//! - Registry and ping are host-provided; the engine only consumes them
//! - `ping` returns a boxed `'static` future so it can run on a spawned task
//! - Backend identity is its name, stable for the process lifetime

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use thiserror::Error;

pub mod registry;
pub mod slp;

pub use registry::StaticRegistry;
pub use slp::SlpBackend;

/// Unique name of a registered backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BackendId(Arc<str>);

impl BackendId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BackendId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for BackendId {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors a liveness query can end with.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Connecting, writing or reading failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend did not answer in time.
    #[error("no answer after {0:?}")]
    Timeout(Duration),

    /// The backend answered with something that is not a status response.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The status payload was not the expected JSON.
    #[error("malformed status JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result of a single liveness query.
#[derive(Debug)]
pub enum PollOutcome {
    /// The backend answered and reported its online player count.
    Success { online: u32 },
    /// The backend could not be reached.
    Failure(ProbeError),
}

impl PollOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PollOutcome::Success { .. })
    }
}

impl From<Result<u32, ProbeError>> for PollOutcome {
    fn from(res: Result<u32, ProbeError>) -> Self {
        match res {
            Ok(online) => PollOutcome::Success { online },
            Err(e) => PollOutcome::Failure(e),
        }
    }
}

/// A single backend server fronted by the proxy.
pub trait BackendServer: Send + Sync {
    /// Stable identity of this backend.
    fn id(&self) -> &BackendId;

    /// Query liveness and player count. Must not block the caller.
    fn ping(&self) -> BoxFuture<'static, PollOutcome>;
}

/// Enumerates the backends currently registered with the proxy.
pub trait BackendRegistry: Send + Sync {
    fn backends(&self) -> Vec<Arc<dyn BackendServer>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_id() {
        let a = BackendId::new("survival");
        let b: BackendId = String::from("survival").into();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "survival");
        assert_eq!(a.as_str(), "survival");
    }

    #[test]
    fn test_outcome_from_result() {
        assert!(PollOutcome::from(Ok::<u32, ProbeError>(3)).is_success());
        let failed = PollOutcome::from(Err::<u32, _>(ProbeError::Timeout(Duration::from_secs(5))));
        match failed {
            PollOutcome::Failure(e) => assert_eq!(e.to_string(), "no answer after 5s"),
            PollOutcome::Success { .. } => panic!("expected failure"),
        }
    }
}
