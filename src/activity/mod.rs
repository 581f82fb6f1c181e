//! Activity tracking subsystem.
//!
//! # Data Flow
//! ```text
//! Proxy events (handshake, status ping, login)
//!     → register.rs (last-active timestamp)
//!
//! Backend poller (players online on a backend)
//!     → register.rs
//!
//! Idle checker (idle.rs), every tick:
//!     proxy occupancy > 0 → register.rs
//!     otherwise read register.rs → threshold breached → graceful shutdown
//! ```
//!
//! # Design Decisions
//! - One shared timestamp, last write wins
//! - Writers always store "now", never an earlier computed value
//! - Precision of a few milliseconds is irrelevant against thresholds of tens of seconds

use std::fmt;

pub mod idle;
pub mod register;

pub use idle::{IdleChecker, IdleVerdict};
pub use register::ActivityRegister;

/// The kind of signal that counted as activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    /// A client opened a connection to the proxy.
    Handshake,
    /// A client asked for the server list status (MOTD ping).
    StatusPing,
    /// A player logged in through the proxy.
    Login,
    /// Sessions were connected to the proxy at an idle check.
    ProxySessions,
    /// A backend reported players online.
    BackendPlayers,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Handshake => "handshake",
            ActivityKind::StatusPing => "status_ping",
            ActivityKind::Login => "login",
            ActivityKind::ProxySessions => "proxy_sessions",
            ActivityKind::BackendPlayers => "backend_players",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
