//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Idle threshold breached ──► sequencer.rs::graceful
//! Backend unreachable ──────► sequencer.rs::crash ──► notice.rs (crash notice)
//!                                    │
//!                                    ▼
//!                       RoutingLayer::shutdown + shutdown.rs (stop tasks)
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → stop the engine without shutting the fleet down
//! ```
//!
//! # Design Decisions
//! - Shutting down is terminal; no path leads back to ACTIVE
//! - Notify sessions first, then stop the proxy

pub mod notice;
pub mod sequencer;
pub mod shutdown;
pub mod signals;

pub use notice::{crash_notice, Locale, NamedColor, Notice};
pub use sequencer::{ShutdownReason, ShutdownSequencer};
pub use shutdown::Shutdown;
