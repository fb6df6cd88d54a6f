//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Default filter comes from config; RUST_LOG overrides it
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - Request-scoped log lines carry the x-request-id

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// `default_filter` is used when RUST_LOG is not set.
pub fn init(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
