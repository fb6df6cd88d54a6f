//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check route names are absolute and distinct
//! - Validate value ranges (timeouts > 0, port valid, chunk size > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function over the config
//! - Runs before a config is accepted into the system, including reloads

use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("route `{0}` must start with '/'")]
    RouteNotAbsolute(String),

    #[error("route `{0}` is bound more than once")]
    DuplicateRoute(String),

    #[error("upstream.address must not be empty")]
    EmptyUpstreamAddress,

    #[error("upstream.port must not be 0")]
    ZeroUpstreamPort,

    #[error("relay.chunk_bytes must be greater than 0")]
    ZeroChunkSize,

    #[error("relay.channel_depth must be greater than 0")]
    ZeroChannelDepth,

    #[error("timeouts.{0} must be greater than 0")]
    ZeroTimeout(&'static str),
}

/// Check a configuration for semantic problems, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let routes = [
        &config.routes.stream,
        &config.routes.status,
        &config.routes.control,
        &config.routes.snapshot,
    ];
    for route in routes {
        if !route.starts_with('/') {
            errors.push(ValidationError::RouteNotAbsolute(route.clone()));
        }
    }
    for (i, route) in routes.iter().enumerate() {
        if routes[..i].contains(route) {
            errors.push(ValidationError::DuplicateRoute((*route).clone()));
        }
    }

    if config.upstream.address.is_empty() {
        errors.push(ValidationError::EmptyUpstreamAddress);
    }
    if config.upstream.port == 0 {
        errors.push(ValidationError::ZeroUpstreamPort);
    }

    if config.relay.chunk_bytes == 0 {
        errors.push(ValidationError::ZeroChunkSize);
    }
    if config.relay.channel_depth == 0 {
        errors.push(ValidationError::ZeroChannelDepth);
    }

    let timeouts = [
        ("connect_secs", config.timeouts.connect_secs),
        ("header_secs", config.timeouts.header_secs),
        ("stream_header_secs", config.timeouts.stream_header_secs),
        ("request_secs", config.timeouts.request_secs),
    ];
    for (name, value) in timeouts {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn rejects_relative_and_duplicate_routes() {
        let mut config = ProxyConfig::default();
        config.routes.stream = "cam".to_string();
        config.routes.snapshot = config.routes.status.clone();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::RouteNotAbsolute("cam".to_string())));
        assert!(errors.contains(&ValidationError::DuplicateRoute("/cam_status".to_string())));
    }

    #[test]
    fn collects_every_error() {
        let mut config = ProxyConfig::default();
        config.upstream.address.clear();
        config.upstream.port = 0;
        config.relay.chunk_bytes = 0;
        config.timeouts.header_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }
}
