//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by route and status
//! - `proxy_request_duration_seconds` (histogram): latency by route
//! - `proxy_active_relays` (gauge): running stream/snapshot relay tasks
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - The route label is the logical operation name, not the configured
//!   path, so renaming routes does not split series

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own address.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished (or dispatched) client request.
pub fn record_request(route: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("proxy_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

/// Guard tracking one live relay task in the active-relays gauge.
///
/// Decrements on drop, so every exit path of a relay is counted.
pub struct RelayGauge {
    kind: &'static str,
}

impl RelayGauge {
    pub fn start(kind: &'static str) -> Self {
        metrics::gauge!("proxy_active_relays", "kind" => kind).increment(1.0);
        Self { kind }
    }
}

impl Drop for RelayGauge {
    fn drop(&mut self) {
        metrics::gauge!("proxy_active_relays", "kind" => self.kind).decrement(1.0);
    }
}
