//! Synchronous status and control forwarders.
//!
//! # Responsibilities
//! - Relay the camera's status document with its declared content type
//! - Dispatch `var`/`val` control commands to the camera
//!
//! Both run inline in the serving context: the upstream round trip
//! completes before the response is built, bounded by the inline-route
//! request timeout. No task is spawned.

use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use tokio::io::AsyncReadExt;

use crate::http::server::AppState;
use crate::observability::metrics;
use crate::proxy::{bad_gateway, connect_and_send, read_header_block, ConnectionMode};

/// Paths requested from the camera.
const STATUS_PATH: &str = "/status";
const CONTROL_PATH: &str = "/control";

/// Content type assumed when the camera does not declare one.
const DEFAULT_STATUS_CONTENT_TYPE: &str = "application/json";

/// GET handler for the status route.
pub async fn serve_status(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let endpoint = state.upstream.snapshot();

    let mut upstream = match connect_and_send(
        &endpoint,
        STATUS_PATH,
        ConnectionMode::Close,
        state.timeouts.connect(),
    )
    .await
    {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(camera = %endpoint.authority(), error = %e, "Status forward could not reach camera");
            metrics::record_request("status", StatusCode::BAD_GATEWAY.as_u16(), started);
            return bad_gateway("Cannot connect to camera.");
        }
    };

    let (head, leftover) = match read_header_block(&mut upstream, state.timeouts.header()).await {
        Ok((head, leftover)) if head.is_success() => (head, leftover),
        Ok((head, _)) => {
            tracing::warn!(status = head.status, "Camera status request refused");
            metrics::record_request("status", StatusCode::BAD_GATEWAY.as_u16(), started);
            return bad_gateway("Bad upstream response");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Status header not parsed");
            metrics::record_request("status", StatusCode::BAD_GATEWAY.as_u16(), started);
            return bad_gateway("Bad upstream response");
        }
    };

    // Close semantics upstream: the body ends at EOF.
    let mut body = Vec::with_capacity(head.content_len.max(leftover.len()));
    body.extend_from_slice(&leftover);
    if let Err(e) = upstream.read_to_end(&mut body).await {
        tracing::warn!(error = %e, "Status body read failed");
        metrics::record_request("status", StatusCode::BAD_GATEWAY.as_u16(), started);
        return bad_gateway("Bad upstream response");
    }

    let content_type = if head.content_type.is_empty() {
        DEFAULT_STATUS_CONTENT_TYPE.to_string()
    } else {
        head.content_type
    };

    metrics::record_request("status", StatusCode::OK.as_u16(), started);
    (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body).into_response()
}

/// Query parameters accepted by the control route.
#[derive(Debug, Deserialize)]
pub struct ControlParams {
    var: Option<String>,
    val: Option<String>,
}

/// GET handler for the control route.
///
/// Fire-and-forget: the camera's verdict is consumed but neither validated
/// nor relayed; a successful dispatch is acknowledged with `200 OK`.
pub async fn serve_control(
    State(state): State<AppState>,
    Query(params): Query<ControlParams>,
) -> Response {
    let started = Instant::now();

    let (Some(var), Some(val)) = (params.var, params.val) else {
        metrics::record_request("control", StatusCode::BAD_REQUEST.as_u16(), started);
        return (StatusCode::BAD_REQUEST, "Missing var or val").into_response();
    };

    let endpoint = state.upstream.snapshot();
    let path = format!(
        "{CONTROL_PATH}?var={}&val={}",
        utf8_percent_encode(&var, NON_ALPHANUMERIC),
        utf8_percent_encode(&val, NON_ALPHANUMERIC),
    );

    let mut upstream = match connect_and_send(
        &endpoint,
        &path,
        ConnectionMode::Close,
        state.timeouts.connect(),
    )
    .await
    {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(camera = %endpoint.authority(), error = %e, "Control forward could not reach camera");
            metrics::record_request("control", StatusCode::BAD_GATEWAY.as_u16(), started);
            return bad_gateway("Cannot connect to camera.");
        }
    };

    if let Err(e) = read_header_block(&mut upstream, state.timeouts.header()).await {
        tracing::debug!(error = %e, var = %var, "Control response header not parsed");
    }

    tracing::debug!(var = %var, val = %val, "Control command dispatched");
    metrics::record_request("control", StatusCode::OK.as_u16(), started);
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain")], "OK").into_response()
}
