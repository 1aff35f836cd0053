//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate header names, locations and URLs before the layer is built
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::config::schema::{FrontendKind, ServerConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a parsed configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("not a socket address: {:?}", config.listener.bind_address),
        ));
    }

    let reproxy = &config.reproxy;
    if HeaderName::try_from(reproxy.header.as_str()).is_err() {
        errors.push(ValidationError::new(
            "reproxy.header",
            format!("not a valid header name: {:?}", reproxy.header),
        ));
    }

    if reproxy.frontend == FrontendKind::Nginx
        && (!reproxy.location.starts_with('/') || HeaderValue::from_str(&reproxy.location).is_err())
    {
        errors.push(ValidationError::new(
            "reproxy.location",
            format!("must be an absolute path: {:?}", reproxy.location),
        ));
    }

    if reproxy.max_hops == 0 {
        errors.push(ValidationError::new("reproxy.max_hops", "must be at least 1"));
    }

    match Url::parse(&config.app.storage_url) {
        Ok(url) if url.host_str().is_some() && url.path().ends_with('/') => {}
        _ => errors.push(ValidationError::new(
            "app.storage_url",
            format!("must be an absolute URL ending in '/': {:?}", config.app.storage_url),
        )),
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("not a socket address: {:?}", config.observability.metrics_address),
        ));
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
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&ServerConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ServerConfig::default();
        config.reproxy.header = "not a header".into();
        config.reproxy.frontend = FrontendKind::Nginx;
        config.reproxy.location = "reproxy".into();
        config.reproxy.max_hops = 0;
        config.app.storage_url = "/storage".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["reproxy.header", "reproxy.location", "reproxy.max_hops", "app.storage_url"]
        );
    }

    #[test]
    fn test_location_only_checked_for_nginx() {
        let mut config = ServerConfig::default();
        config.reproxy.location = "relative".into();
        assert!(validate_config(&config).is_ok());
    }
}
