//! Live MJPEG stream relay.
//!
//! # Responsibilities
//! - Answer the stream route with a persistent multipart response
//! - Spawn a dedicated task that forwards the camera's body verbatim
//! - Throttle forwarding so one busy stream cannot starve its peers
//!
//! # Design Decisions
//! - The response head is synthesized before the camera's own header block
//!   is even read; the camera's status is not checked (see DESIGN.md)
//! - Multipart boundaries are not parsed; bytes pass through opaquely

use std::convert::Infallible;
use std::time::{Duration, Instant};

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
const STREAM_PATH: &str = "/stream";

/// Content type advertised to the client. The camera's multipart body is
/// forwarded verbatim, boundary markers included.
const STREAM_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

/// GET handler for the stream route.
///
/// Connects to the camera, then hands the connection to a spawned relay
/// task and returns immediately with a streaming body, leaving the serving
/// context free for further requests.
pub async fn serve_stream(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let endpoint = state.upstream.snapshot();

    let upstream = match connect_and_send(
        &endpoint,
        STREAM_PATH,
        ConnectionMode::KeepAlive,
        state.timeouts.connect(),
    )
    .await
    {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(camera = %endpoint.authority(), error = %e, "Stream relay could not reach camera");
            metrics::record_request("stream", StatusCode::BAD_GATEWAY.as_u16(), started);
            return bad_gateway("Cannot connect to camera.");
        }
    };

    let (tx, rx) = mpsc::channel::<Bytes>(state.relay.channel_depth);
    let relay = state.relay.clone();
    let header_deadline = state.timeouts.stream_header();
    tokio::spawn(async move {
        relay_stream(upstream, tx, relay, header_deadline).await;
    });

    tracing::debug!(camera = %endpoint.authority(), "Stream relay started");
    metrics::record_request("stream", StatusCode::OK.as_u16(), started);

    let body = Body::from_stream(ReceiverStream::new(rx).map(Ok::<_, Infallible>));
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, STREAM_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response()
}

/// Body producer for one stream response.
///
/// Owns the upstream connection and the client channel; every exit path
/// releases both by drop. Terminates on upstream EOF/error or when the
/// client goes away.
async fn relay_stream(
    mut upstream: TcpStream,
    tx: mpsc::Sender<Bytes>,
    relay: RelayConfig,
    header_deadline: Duration,
) {
    let _gauge = RelayGauge::start("stream");

    // The camera's own header block is consumed and discarded; the client
    // already has this relay's synthesized head. A camera that never
    // finishes its header block still gets the rest of its bytes forwarded.
    match read_header_block(&mut upstream, header_deadline).await {
        Ok((head, leftover)) => {
            tracing::debug!(status = head.status, "Camera stream header consumed");
            if !leftover.is_empty() && tx.send(leftover).await.is_err() {
                return;
            }
        }
        Err(e) => tracing::debug!(error = %e, "Proceeding without a parsed stream header"),
    }

    let mut chunk = vec![0u8; relay.chunk_bytes];
    let mut last_pause = Instant::now();
    loop {
        let n = tokio::select! {
            result = upstream.read(&mut chunk) => match result {
                Ok(0) => break, // camera closed the stream
                Ok(n) => n,
                Err(e) => {
                    tracing::debug!(error = %e, "Camera read failed");
                    break;
                }
            },
            // Client-liveness check while blocked on a quiet camera.
            _ = tx.closed() => break,
        };

        if tx.send(Bytes::copy_from_slice(&chunk[..n])).await.is_err() {
            break; // client went away mid-write
        }

        if last_pause.elapsed() >= relay.throttle_interval() {
            tokio::time::sleep(relay.throttle_pause()).await;
            last_pause = Instant::now();
        }
    }

    tracing::debug!("Stream relay finished");
}
