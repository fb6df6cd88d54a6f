//! Camera proxy core.
//!
//! # Data Flow
//! ```text
//! Client request
//!     → http/server.rs (route dispatch)
//!     → upstream.rs (snapshot endpoint, one TCP connect, minimal GET)
//!     → header.rs (decode the camera's status line + headers)
//!     → stream.rs / snapshot.rs (spawned relay task feeds the body)
//!       control.rs (status/control answered inline)
//!     → Client response
//! ```
//!
//! # Design Decisions
//! - One upstream connection attempt per client request; nothing retries
//! - Relay tasks own their upstream connection and body channel outright;
//!   every exit path releases both by drop
//! - The stream relay synthesizes its response head without consulting the
//!   camera's status; snapshot and status require a 200 (see DESIGN.md)

pub mod control;
pub mod header;
pub mod snapshot;
pub mod stream;
pub mod upstream;

pub use header::{read_header_block, ResponseHeader, MAX_HEADER_BYTES};
pub use upstream::{connect_and_send, ConnectionMode, UpstreamEndpoint, UpstreamHandle};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors on the upstream (camera) leg of a proxied request.
///
/// None of these are retried; each client request maps to exactly one
/// upstream connection attempt.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("cannot connect to camera at {authority}: {source}")]
    Connect {
        authority: String,
        source: std::io::Error,
    },

    #[error("camera did not finish its header block in time")]
    HeaderTimeout,

    #[error("camera header block exceeded {MAX_HEADER_BYTES} bytes")]
    HeaderTooLarge,

    #[error("camera i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Plain-text `502 Bad Gateway` answer shared by the proxy handlers.
pub(crate) fn bad_gateway(reason: &'static str) -> Response {
    (StatusCode::BAD_GATEWAY, reason).into_response()
}
