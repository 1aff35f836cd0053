//! Error types raised while resolving a reproxy.
//!
//! # Design Decisions
//! - A malformed reproxy target is an inner-handler bug; it fails the request
//!   instead of emitting a broken rewrite header
//! - Hop exhaustion maps to `508 Loop Detected`
//! - `ReproxyError` is the interceptor's `Service::Error`; it implements
//!   `IntoResponse` so it can sit behind axum's `HandleErrorLayer`

use axum::{
    http::{
        header::{InvalidHeaderName, InvalidHeaderValue, ToStrError},
        uri::InvalidUri,
        HeaderName, StatusCode,
    },
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Boxed error produced by wrapped services.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by the reproxy interceptor and its strategies.
#[derive(Debug, Error)]
pub enum ReproxyError {
    /// The signal header value is not a parseable URL.
    #[error("invalid reproxy url {value:?}: {source}")]
    InvalidUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    /// The signal header value holds bytes outside visible ASCII.
    #[error("unreadable reproxy url: {0}")]
    UnreadableUrl(#[source] ToStrError),

    /// The signal URL parsed but names no host to route to.
    #[error("reproxy url {value:?} has no host")]
    MissingHost { value: String },

    /// A strategy was invoked on a response without the signal header.
    #[error("response carries no {0} header")]
    MissingSignal(HeaderName),

    /// The configured signal header is not a valid header name.
    #[error("invalid header name: {0}")]
    InvalidHeaderName(#[from] InvalidHeaderName),

    /// A value could not be encoded as an HTTP header.
    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] InvalidHeaderValue),

    /// The synthesized request target is not a valid URI.
    #[error("invalid redispatch uri: {0}")]
    InvalidUri(#[from] InvalidUri),

    /// Self-dispatch chained more times than allowed.
    #[error("reproxy chain exceeded {limit} hops")]
    HopLimitExceeded { limit: u32 },

    /// The wrapped service failed.
    #[error("inner service failed: {0}")]
    Inner(BoxError),
}

impl ReproxyError {
    /// Status code reported to the client for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ReproxyError::HopLimitExceeded { .. } => StatusCode::LOOP_DETECTED,
            ReproxyError::Inner(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ReproxyError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Reproxy failed");
        (self.status(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = ReproxyError::HopLimitExceeded { limit: 16 };
        assert_eq!(err.status(), StatusCode::LOOP_DETECTED);
        assert_eq!(err.to_string(), "reproxy chain exceeded 16 hops");

        let err = ReproxyError::MissingHost { value: "mailto:x".into() };
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = ReproxyError::Inner("boom".into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
