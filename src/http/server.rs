//! HTTP server setup and route dispatch.
//!
//! # Responsibilities
//! - Create the Axum router binding the four camera routes
//! - Wire up middleware (request IDs, tracing, inline-route timeout)
//! - Hold the shared upstream handle and relay tuning
//! - Serve with graceful shutdown and apply config reloads

use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{ProxyConfig, RelayConfig, TimeoutConfig};
use crate::http::request::MakeRequestUuid;
use crate::proxy::control::{serve_control, serve_status};
use crate::proxy::snapshot::serve_snapshot;
use crate::proxy::stream::serve_stream;
use crate::proxy::upstream::{UpstreamEndpoint, UpstreamHandle};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared camera endpoint; handlers snapshot it at dispatch time.
    pub upstream: UpstreamHandle,
    pub timeouts: TimeoutConfig,
    pub relay: RelayConfig,
}

/// HTTP server for the camera proxy.
pub struct HttpServer {
    router: Router,
    upstream: UpstreamHandle,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let upstream = UpstreamHandle::new(UpstreamEndpoint::from(&config.upstream));
        let state = AppState {
            upstream: upstream.clone(),
            timeouts: config.timeouts.clone(),
            relay: config.relay.clone(),
        };
        let router = Self::build_router(&config, state);
        Self { router, upstream }
    }

    /// Build the Axum router.
    ///
    /// Status and control run inline and are bounded by a whole-request
    /// timeout. The streaming routes are exempt: a live stream must never
    /// be cut down by a request deadline.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let inline = Router::new()
            .route(&config.routes.status, get(serve_status))
            .route(&config.routes.control, get(serve_control))
            .route_layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )));

        let streaming = Router::new()
            .route(&config.routes.stream, get(serve_stream))
            .route(&config.routes.snapshot, get(serve_snapshot));

        inline
            .merge(streaming)
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Handle used to read or re-point the camera endpoint at runtime.
    pub fn upstream(&self) -> UpstreamHandle {
        self.upstream.clone()
    }

    /// Run the server on the given listener until shutdown.
    ///
    /// Config reloads arriving on `config_updates` re-point the upstream
    /// handle; relays already running keep their captured endpoint.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ProxyConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            camera = %self.upstream.snapshot().authority(),
            "HTTP server starting"
        );

        let upstream = self.upstream.clone();
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                upstream.set(UpstreamEndpoint::from(&new_config.upstream));
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
