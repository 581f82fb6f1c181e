//! Idle-shutdown controller for a proxy fleet.
//!
//! Watches every signal of activity across a proxy and its backend servers
//! and shuts the whole fleet down when nothing has happened for a while, or
//! when a backend stops answering long enough to look crashed.

pub mod activity;
pub mod backend;
pub mod clock;
pub mod config;
pub mod controller;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod sidecar;

pub use activity::ActivityKind;
pub use backend::{BackendId, BackendRegistry, BackendServer, PollOutcome, ProbeError};
pub use config::AutoShutdownConfig;
pub use controller::{AutoShutdown, Settings};
pub use lifecycle::{Notice, ShutdownReason};
pub use routing::{RoutingLayer, Session};
