//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (tracing fmt layer)
//!     → Prometheus scrape endpoint
//! ```

pub mod logging;
pub mod metrics;
