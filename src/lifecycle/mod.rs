//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Init logging/metrics → Bind → Serve
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C or trigger() → broadcast → server drains and exits
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
