//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated)
//!     → consumed at server construction
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs + validation.rs
//!     → fresh ProxyConfig on the reload channel
//!     → server re-points the upstream handle
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so a missing or minimal config works
//! - Validation separates syntactic (serde) from semantic checks
//! - A failed reload never replaces the running configuration

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ListenerConfig, ObservabilityConfig, ProxyConfig, RelayConfig, RoutesConfig, TimeoutConfig,
    UpstreamConfig,
};
