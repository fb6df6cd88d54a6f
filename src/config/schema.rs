//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so an empty config is a working config.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the camera proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The camera endpoint every request is forwarded to.
    pub upstream: UpstreamConfig,

    /// Client-facing route names.
    pub routes: RoutesConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Byte-relay tuning.
    pub relay: RelayConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// The camera device being proxied to.
///
/// Changes to this section in a watched config file are applied to requests
/// dispatched after the reload; in-flight relays keep the endpoint they
/// captured at spawn time.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Camera address, IP or hostname. Also sent as the Host header.
    pub address: String,

    /// Camera HTTP port.
    pub port: u16,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "192.168.4.201".to_string(),
            port: 80,
        }
    }
}

/// Names of the routes exposed to clients.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Live MJPEG stream route.
    pub stream: String,

    /// Camera status route.
    pub status: String,

    /// Parameter control route.
    pub control: String,

    /// Single-frame snapshot route.
    pub snapshot: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            stream: "/cam".to_string(),
            status: "/cam_status".to_string(),
            control: "/cam_control".to_string(),
            snapshot: "/cam_snapshot".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream TCP connect timeout in seconds.
    pub connect_secs: u64,

    /// Header-block timeout for snapshot, status and control, in seconds.
    pub header_secs: u64,

    /// Header-block timeout for the stream relay, in seconds. Generous:
    /// the camera may be mid-frame when the request lands.
    pub stream_header_secs: u64,

    /// Whole-request timeout for the inline (status/control) routes, in
    /// seconds. Streaming routes are exempt.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            header_secs: 2,
            stream_header_secs: 3,
            request_secs: 30,
        }
    }
}

impl TimeoutConfig {
    /// Upstream TCP connect deadline.
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    /// Header-block deadline for snapshot, status and control.
    pub fn header(&self) -> Duration {
        Duration::from_secs(self.header_secs)
    }

    /// Header-block deadline for the stream relay.
    pub fn stream_header(&self) -> Duration {
        Duration::from_secs(self.stream_header_secs)
    }
}

/// Byte-relay tuning for the stream and snapshot tasks.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Bytes read from the camera per chunk. The default matches one
    /// network packet worth of payload.
    pub chunk_bytes: usize,

    /// Forward for this many milliseconds, then pause.
    pub throttle_interval_ms: u64,

    /// Length of the throttle pause in milliseconds.
    pub throttle_pause_ms: u64,

    /// Client-body backpressure depth, in chunks.
    pub channel_depth: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            chunk_bytes: 1460,
            throttle_interval_ms: 3,
            throttle_pause_ms: 2,
            channel_depth: 4,
        }
    }
}

impl RelayConfig {
    /// How long the relay forwards before it pauses.
    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_interval_ms)
    }

    /// How long the relay pauses.
    pub fn throttle_pause(&self) -> Duration {
        Duration::from_millis(self.throttle_pause_ms)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default tracing filter; RUST_LOG overrides it when set.
    pub log_filter: String,

    /// Enable the Prometheus metrics exporter.
    pub metrics_enabled: bool,

    /// Metrics exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "cam_proxy=info,tower_http=info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
