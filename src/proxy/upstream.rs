//! Upstream endpoint handle and connector.
//!
//! # Responsibilities
//! - Hold the camera endpoint behind an atomically swappable handle
//! - Make exactly one TCP connect attempt per request
//! - Send the minimal GET request the camera expects
//!
//! # Design Decisions
//! - Requests capture an endpoint snapshot at dispatch time; a swap never
//!   disturbs relays already running on their captured copy
//! - The request carries only a Host header and a Connection directive:
//!   no body, no auth, no negotiation

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::UpstreamConfig;
use crate::proxy::UpstreamError;

/// The fixed camera endpoint a request is proxied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamEndpoint {
    /// Camera address, IP or hostname; also used as the Host header.
    pub address: String,

    /// Camera HTTP port.
    pub port: u16,
}

impl UpstreamEndpoint {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// `address:port` form used for connecting and logging.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

impl From<&UpstreamConfig> for UpstreamEndpoint {
    fn from(config: &UpstreamConfig) -> Self {
        Self::new(config.address.clone(), config.port)
    }
}

/// Shared handle to the camera endpoint.
///
/// The single owner of the mutable endpoint. Every request takes a
/// [`snapshot`](Self::snapshot) at dispatch time and never re-reads live
/// state; [`set`](Self::set) affects only requests dispatched afterward.
#[derive(Clone)]
pub struct UpstreamHandle {
    inner: Arc<ArcSwap<UpstreamEndpoint>>,
}

impl UpstreamHandle {
    pub fn new(endpoint: UpstreamEndpoint) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(endpoint)),
        }
    }

    /// The endpoint as of this instant; stable for the caller's lifetime.
    pub fn snapshot(&self) -> Arc<UpstreamEndpoint> {
        self.inner.load_full()
    }

    /// Replace the endpoint for subsequently dispatched requests.
    pub fn set(&self, endpoint: UpstreamEndpoint) {
        let previous = self.inner.swap(Arc::new(endpoint));
        let current = self.inner.load();
        if **current != *previous {
            tracing::info!(
                from = %previous.authority(),
                to = %current.authority(),
                "Camera endpoint re-pointed"
            );
        }
    }
}

/// Connection directive sent with the upstream request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// The connection outlives the response (stream relay).
    KeepAlive,
    /// The camera closes after one response (snapshot/status/control).
    Close,
}

impl ConnectionMode {
    fn directive(self) -> &'static str {
        match self {
            ConnectionMode::KeepAlive => "keep-alive",
            ConnectionMode::Close => "close",
        }
    }
}

/// Connect to the camera and send a minimal GET request for `path`.
///
/// Exactly one connect attempt, bounded by `connect_timeout`; a failed
/// attempt is terminal for the request.
pub async fn connect_and_send(
    endpoint: &UpstreamEndpoint,
    path: &str,
    mode: ConnectionMode,
    connect_timeout: Duration,
) -> Result<TcpStream, UpstreamError> {
    let connect = TcpStream::connect((endpoint.address.as_str(), endpoint.port));
    let mut stream = match timeout(connect_timeout, connect).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            return Err(UpstreamError::Connect {
                authority: endpoint.authority(),
                source: e,
            })
        }
        Err(_) => {
            return Err(UpstreamError::Connect {
                authority: endpoint.authority(),
                source: std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out"),
            })
        }
    };

    let request = format!(
        "GET {path} HTTP/1.1\r\nHost: {host}\r\nConnection: {directive}\r\n\r\n",
        host = endpoint.address,
        directive = mode.directive(),
    );
    stream.write_all(request.as_bytes()).await?;

    Ok(stream)
}
