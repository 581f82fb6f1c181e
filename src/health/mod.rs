//! Backend health subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic timer (poller.rs)
//!     → ping every backend concurrently
//!     → Success: tracker.rs (last contact = now)
//!                + players > 0 → activity register
//!     → Failure: tracker.rs (now - last contact)
//!                ≥ unreachable threshold → crash shutdown
//! ```
//!
//! # Design Decisions
//! - Pings of one cycle never wait on each other; cycles may overlap
//! - Never contacted means contacted at the clock epoch
//! - Health state is per-backend, escalation is fleet-wide

pub mod poller;
pub mod tracker;

pub use poller::{BackendPoller, PollVerdict};
pub use tracker::HealthTracker;
