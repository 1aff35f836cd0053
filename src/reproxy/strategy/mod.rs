//! Front-end specific response decoration.
//!
//! # Design Decisions
//! - Strategies differ only in how they decorate a reproxied response
//! - `decorate` is async so self-dispatch can call back into a service;
//!   the header-only strategies return a ready future
//! - No shared mutable state: every strategy is `Clone` and reentrant

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, Request, Response},
};
use futures_util::future::BoxFuture;
use tower::util::BoxCloneSyncService;
use url::Url;

use crate::error::ReproxyError;
use crate::reproxy::Exchange;

pub mod accel;
pub mod dispatch;
pub mod frontend;
pub mod marker;
pub mod rewrite;

pub use accel::AccelRedirect;
pub use dispatch::SelfDispatch;
pub use frontend::Frontend;
pub use marker::Marker;
pub use rewrite::RewriteHeaders;

/// Type-erased handle to a service a strategy may redispatch into.
pub type Loopback = BoxCloneSyncService<Request<Body>, Response<Body>, ReproxyError>;

/// Decorates a response whose inner handler requested a reproxy.
pub trait Strategy: Clone + Send + Sync + 'static {
    /// Short name used in logs and metric labels.
    fn name(&self) -> &'static str;

    /// Turn the inner response (signal header set, body irrelevant) into the
    /// response sent to the client or front-end.
    fn decorate(
        &self,
        exchange: Exchange,
        response: Response<Body>,
        context: Context,
    ) -> BoxFuture<'static, Result<Response<Body>, ReproxyError>>;
}

/// What the interceptor knows about the reproxy being decorated.
#[derive(Clone)]
pub struct Context {
    signal: HeaderName,
    loopback: Loopback,
}

impl Context {
    pub fn new(signal: HeaderName, loopback: Loopback) -> Self {
        Self { signal, loopback }
    }

    /// Header carrying the reproxy URL.
    pub fn signal(&self) -> &HeaderName {
        &self.signal
    }

    /// The interceptor itself, wrapping its inner service.
    pub fn loopback(&self) -> Loopback {
        self.loopback.clone()
    }

    /// Parse the signal header in `headers` as an absolute URL.
    pub fn target(&self, headers: &HeaderMap) -> Result<Url, ReproxyError> {
        let value = headers
            .get(&self.signal)
            .ok_or_else(|| ReproxyError::MissingSignal(self.signal.clone()))?;
        parse_target(value)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("signal", &self.signal)
            .finish_non_exhaustive()
    }
}

/// Parse a signal value. The URL must be absolute and name a host.
pub fn parse_target(value: &HeaderValue) -> Result<Url, ReproxyError> {
    let raw = value.to_str().map_err(|source| {
        tracing::error!(value = ?value, "Reproxy url is not visible ASCII");
        ReproxyError::UnreadableUrl(source)
    })?;
    let url = Url::parse(raw).map_err(|source| {
        tracing::error!(value = %raw, error = %source, "Malformed reproxy url");
        ReproxyError::InvalidUrl {
            value: raw.to_string(),
            source,
        }
    })?;

    if url.host_str().is_none() {
        return Err(ReproxyError::MissingHost {
            value: raw.to_string(),
        });
    }
    Ok(url)
}

/// Path plus `?query` when the URL has one.
pub fn request_target(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target() {
        let url = parse_target(&HeaderValue::from_static("http://foo/bar?a=b")).unwrap();
        assert_eq!(url.host_str(), Some("foo"));

        let err = parse_target(&HeaderValue::from_static("foo")).unwrap_err();
        assert!(matches!(err, ReproxyError::InvalidUrl { .. }));

        let err = parse_target(&HeaderValue::from_static("mailto:ops@example.com")).unwrap_err();
        assert!(matches!(err, ReproxyError::MissingHost { .. }));
    }

    #[test]
    fn test_parse_target_rejects_opaque_bytes() {
        let value = HeaderValue::from_bytes(b"http://foo/caf\xe9").unwrap();
        let err = parse_target(&value).unwrap_err();
        assert!(matches!(err, ReproxyError::UnreadableUrl(_)));
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_request_target() {
        let url = Url::parse("http://foo/bar?a=b").unwrap();
        assert_eq!(request_target(&url), "/bar?a=b");

        let url = Url::parse("http://foo/bar").unwrap();
        assert_eq!(request_target(&url), "/bar");

        let url = Url::parse("http://foo").unwrap();
        assert_eq!(request_target(&url), "/");
    }
}
