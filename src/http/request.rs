//! Request identity.
//!
//! # Responsibilities
//! - Give every request an `x-request-id` (UUID v4) as early as possible
//! - Propagate the id onto the response so log lines across a relay's
//!   lifetime can be correlated with what the client saw

use axum::http::{HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the request id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a fresh UUID v4 for each incoming request.
#[derive(Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}
