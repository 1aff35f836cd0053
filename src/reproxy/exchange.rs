//! Per-request context carried through the interceptor.
//!
//! # Responsibilities
//! - Snapshot the request metadata before the inner service consumes it
//! - Define the typed out-of-band flags (signal header, mount path, hops)
//! - Define the deferred-location response body

use axum::{
    body::Body,
    extract::NestedPath,
    http::{Extensions, HeaderMap, HeaderName, Method, Request, Uri, Version},
    response::{IntoResponse, Response},
};
use url::Url;

/// Names the header the inner handler should set to request a reproxy.
///
/// Inserted by the outermost interceptor and never overwritten by nested ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalHeader(pub HeaderName);

/// Explicit script-mount prefix the request was routed under.
///
/// The request URI path is relative to this prefix. Routers mounted with
/// `Router::nest` or `Router::nest_service` need not set it: axum's
/// `NestedPath` is used when this is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPath(String);

impl MountPath {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Present only on requests synthesized by self-dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redispatched {
    /// Number of self-dispatches in the chain so far.
    pub hops: u32,
}

/// Deferred-location body: "fetch this URL instead".
///
/// Handlers return it in place of a body. It becomes an empty response
/// carrying the URL in its extensions, which the interceptor turns into the
/// signal header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReproxyTo(pub Url);

impl IntoResponse for ReproxyTo {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::empty());
        response.extensions_mut().insert(self);
        response
    }
}

/// Snapshot of a request's metadata, handed to strategies.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    pub extensions: Extensions,
}

impl Exchange {
    /// Capture everything except the body.
    pub fn capture<B>(request: &Request<B>) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            version: request.version(),
            headers: request.headers().clone(),
            extensions: request.extensions().clone(),
        }
    }

    /// Mount prefix: an explicit `MountPath`, else axum's `NestedPath`.
    pub fn mount_path(&self) -> Option<&str> {
        match self.extensions.get::<MountPath>() {
            Some(mount) => Some(mount.as_str()),
            None => self.extensions.get::<NestedPath>().map(NestedPath::as_str),
        }
    }

    /// Self-dispatch hops already taken to reach this exchange.
    pub fn hops(&self) -> u32 {
        self.extensions
            .get::<Redispatched>()
            .map(|r| r.hops)
            .unwrap_or(0)
    }

    pub fn signal_header(&self) -> Option<&HeaderName> {
        self.extensions.get::<SignalHeader>().map(|s| &s.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reproxy_to_response() {
        let url = Url::parse("http://storage.internal/a/b").unwrap();
        let response = ReproxyTo(url.clone()).into_response();

        assert_eq!(response.status(), 200);
        assert_eq!(response.extensions().get::<ReproxyTo>(), Some(&ReproxyTo(url)));
    }

    #[test]
    fn test_capture() {
        let mut request = Request::builder()
            .method("POST")
            .uri("/files/a?x=1")
            .header("Host", "example.com")
            .body(Body::empty())
            .unwrap();
        request.extensions_mut().insert(MountPath::new("/app"));
        request.extensions_mut().insert(Redispatched { hops: 2 });

        let exchange = Exchange::capture(&request);
        assert_eq!(exchange.method, Method::POST);
        assert_eq!(exchange.uri.path(), "/files/a");
        assert_eq!(exchange.headers["host"], "example.com");
        assert_eq!(exchange.mount_path(), Some("/app"));
        assert_eq!(exchange.hops(), 2);
        assert_eq!(exchange.signal_header(), None);
    }
}
