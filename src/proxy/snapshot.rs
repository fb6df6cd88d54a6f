//! Single-frame snapshot relay.
//!
//! # Responsibilities
//! - Fetch exactly one JPEG from the camera and relay it
//! - Require a parsed, successful camera header before any byte reaches
//!   the client
//!
//! Stricter than the stream relay: a camera that answers with anything but
//! a 200, or whose header block cannot be parsed in time, yields a `502`
//! and zero forwarded image bytes.

use std::convert::Infallible;
use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use crate::config::RelayConfig;
use crate::http::server::AppState;
use crate::observability::metrics::{self, RelayGauge};
use crate::proxy::{bad_gateway, connect_and_send, read_header_block, ConnectionMode};

/// Path requested from the camera.
const SNAPSHOT_PATH: &str = "/snapshot";

/// GET handler for the snapshot route.
pub async fn serve_snapshot(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let endpoint = state.upstream.snapshot();

    let mut upstream = match connect_and_send(
        &endpoint,
        SNAPSHOT_PATH,
        ConnectionMode::Close,
        state.timeouts.connect(),
    )
    .await
    {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(camera = %endpoint.authority(), error = %e, "Snapshot relay could not reach camera");
            metrics::record_request("snapshot", StatusCode::BAD_GATEWAY.as_u16(), started);
            return bad_gateway("Cannot connect to camera.");
        }
    };

    let leftover = match read_header_block(&mut upstream, state.timeouts.header()).await {
        Ok((head, leftover)) if head.is_success() => leftover,
        Ok((head, _)) => {
            tracing::warn!(status = head.status, "Camera refused the snapshot");
            metrics::record_request("snapshot", StatusCode::BAD_GATEWAY.as_u16(), started);
            return bad_gateway("Bad response");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Snapshot header not parsed");
            metrics::record_request("snapshot", StatusCode::BAD_GATEWAY.as_u16(), started);
            return bad_gateway("Bad response");
        }
    };

    let (tx, rx) = mpsc::channel::<Bytes>(state.relay.channel_depth);
    let relay = state.relay.clone();
    tokio::spawn(async move {
        relay_snapshot(upstream, tx, leftover, relay).await;
    });

    metrics::record_request("snapshot", StatusCode::OK.as_u16(), started);

    let body = Body::from_stream(ReceiverStream::new(rx).map(Ok::<_, Infallible>));
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/jpeg")],
        body,
    )
        .into_response()
}

/// Forwards one JPEG body, then exits; there is no second frame.
async fn relay_snapshot(
    mut upstream: TcpStream,
    tx: mpsc::Sender<Bytes>,
    leftover: Bytes,
    relay: RelayConfig,
) {
    let _gauge = RelayGauge::start("snapshot");

    if !leftover.is_empty() && tx.send(leftover).await.is_err() {
        return;
    }

    let mut chunk = vec![0u8; relay.chunk_bytes];
    loop {
        let n = tokio::select! {
            result = upstream.read(&mut chunk) => match result {
                Ok(0) => break, // image fully forwarded; camera closed
                Ok(n) => n,
                Err(e) => {
                    tracing::debug!(error = %e, "Camera read failed");
                    break;
                }
            },
            _ = tx.closed() => break,
        };

        if tx.send(Bytes::copy_from_slice(&chunk[..n])).await.is_err() {
            break;
        }

        tokio::task::yield_now().await;
    }

    tracing::debug!("Snapshot relay finished");
}
