//! Routing layer (proxy) seam.
//!
//! # Data Flow
//! ```text
//! Idle checker      → connected_sessions()
//! Shutdown sequencer → sessions() → Session::disconnect(notice)
//!                    → shutdown()
//! ```
//!
//! # Design Decisions
//! - The proxy owns connections and its own termination; the engine only asks
//! - `shutdown` may be called more than once and must tolerate it

use std::sync::Arc;

use crate::lifecycle::notice::Notice;

/// A client session connected to the proxy.
pub trait Session: Send + Sync {
    /// Display name, used in logs.
    fn name(&self) -> String;

    /// Close the session, showing `reason` to the user.
    fn disconnect(&self, reason: &Notice);
}

/// The proxy in front of the backend fleet.
pub trait RoutingLayer: Send + Sync {
    /// Number of sessions directly connected to the proxy right now.
    fn connected_sessions(&self) -> usize;

    /// Handles to every connected session.
    fn sessions(&self) -> Vec<Arc<dyn Session>>;

    /// Terminate the proxy, and with it the fleet.
    fn shutdown(&self);
}
