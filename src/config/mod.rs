//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AutoShutdownConfig (validated, immutable)
//!     → thresholds copied into the idle checker and backend poller
//! ```
//!
//! # Design Decisions
//! - Read once at startup; thresholds never change for the process lifetime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AutoShutdownConfig, IdleConfig, NoticeConfig, ObservabilityConfig, PollingConfig,
    ServerConfig, SidecarConfig,
};
pub use validation::{validate_config, ValidationError};
