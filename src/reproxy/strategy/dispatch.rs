//! Self-dispatch strategy (Rack).
//!
//! Reproxy without an HTTP roundtrip: synthesize a request for the signal
//! URL, dispatch it to a service (by default back through the interceptor),
//! and merge the proxied response onto the original one. Useful when the
//! target sits behind something like an HTTP cache in the same process.
//!
//! # Design Decisions
//! - The signal header is consumed, not forwarded
//! - On header collisions the proxied response wins
//! - Status and body come from the proxied response only
//! - Chains are bounded by `max_hops`

use axum::{
    body::Body,
    http::{
        header::{CONTENT_LENGTH, HOST, TRANSFER_ENCODING},
        HeaderValue, Request, Response, Uri,
    },
};
use futures_util::future::{BoxFuture, FutureExt};
use tower::{util::BoxCloneSyncService, Service, ServiceExt};
use url::Url;

use super::{marker::mark, parse_target, Context, Loopback, Strategy};
use crate::error::{BoxError, ReproxyError};
use crate::reproxy::{Exchange, Redispatched, X_REPROXIED};

/// Redispatches the reproxy in-process.
#[derive(Clone)]
pub struct SelfDispatch {
    /// `None` loops back through the interceptor.
    target: Option<Loopback>,
    max_hops: u32,
}

impl SelfDispatch {
    pub const DEFAULT_MAX_HOPS: u32 = 16;

    /// Dispatch back into the service the interceptor wraps.
    pub fn new() -> Self {
        Self {
            target: None,
            max_hops: Self::DEFAULT_MAX_HOPS,
        }
    }

    /// Dispatch into a different service.
    pub fn to<S>(service: S) -> Self
    where
        S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + Sync + 'static,
        S::Future: Send + 'static,
        S::Error: Into<BoxError>,
    {
        let service = service.map_err(|e: S::Error| ReproxyError::Inner(e.into()));
        Self {
            target: Some(BoxCloneSyncService::new(service)),
            max_hops: Self::DEFAULT_MAX_HOPS,
        }
    }

    pub fn max_hops(mut self, max_hops: u32) -> Self {
        self.max_hops = max_hops;
        self
    }
}

impl Default for SelfDispatch {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SelfDispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelfDispatch")
            .field("loopback", &self.target.is_none())
            .field("max_hops", &self.max_hops)
            .finish()
    }
}

impl Strategy for SelfDispatch {
    fn name(&self) -> &'static str {
        "rack"
    }

    fn decorate(
        &self,
        exchange: Exchange,
        response: Response<Body>,
        context: Context,
    ) -> BoxFuture<'static, Result<Response<Body>, ReproxyError>> {
        let target = self.target.clone().unwrap_or_else(|| context.loopback());
        let max_hops = self.max_hops;

        async move {
            let hops = exchange.hops();
            if hops >= max_hops {
                tracing::error!(hops, uri = %exchange.uri, "Reproxy chain too long");
                return Err(ReproxyError::HopLimitExceeded { limit: max_hops });
            }

            let (mut original, _) = mark(response).into_parts();
            let value = original
                .headers
                .remove(context.signal())
                .ok_or_else(|| ReproxyError::MissingSignal(context.signal().clone()))?;
            let url = parse_target(&value)?;

            let request = redispatch_request(exchange, &url, hops + 1)?;
            tracing::debug!(
                hop = hops + 1,
                host = ?request.headers().get(HOST),
                uri = %request.uri(),
                "Redispatching reproxy"
            );

            let (mut proxied, body) = target.oneshot(request).await?.into_parts();
            let mut headers = original.headers;
            headers.extend(std::mem::take(&mut proxied.headers));
            proxied.headers = headers;
            Ok(Response::from_parts(proxied, body))
        }
        .boxed()
    }
}

/// Build the request sent to the redispatch target.
///
/// Clones the original metadata, then points host, path and query at `url`.
/// A missing query clears the original one.
pub fn redispatch_request(
    exchange: Exchange,
    url: &Url,
    hops: u32,
) -> Result<Request<Body>, ReproxyError> {
    let host = url.host_str().ok_or_else(|| ReproxyError::MissingHost {
        value: url.to_string(),
    })?;
    let authority = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    let path = match exchange.mount_path() {
        Some(mount) => strip_mount(mount, url.path()),
        None => url.path(),
    };
    let uri: Uri = match url.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    }
    .parse()?;

    let Exchange {
        method,
        version,
        mut headers,
        mut extensions,
        ..
    } = exchange;
    headers.remove(CONTENT_LENGTH);
    headers.remove(TRANSFER_ENCODING);
    headers.insert(HOST, HeaderValue::try_from(authority)?);
    headers.insert(X_REPROXIED, HeaderValue::from_static("1"));
    extensions.insert(Redispatched { hops });

    let mut request = Request::new(Body::empty());
    *request.method_mut() = method;
    *request.uri_mut() = uri;
    *request.version_mut() = version;
    *request.headers_mut() = headers;
    *request.extensions_mut() = extensions;
    Ok(request)
}

/// Make `path` relative to `mount` when it lies under it.
fn strip_mount<'a>(mount: &str, path: &'a str) -> &'a str {
    let mount = mount.trim_end_matches('/');
    if mount.is_empty() {
        return path;
    }
    match path.strip_prefix(mount) {
        Some("") => "/",
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reproxy::strategy::test_support::{context, signalled};
    use crate::reproxy::{MountPath, X_REPROXY_URL};
    use axum::http::Method;
    use std::convert::Infallible;

    /// Echoes what the redispatched request looked like.
    async fn echo(req: Request<Body>) -> Result<Response<Body>, Infallible> {
        let flag = req
            .headers()
            .get(X_REPROXIED)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let host = req
            .headers()
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let body = format!(
            "{}|{}|{}|{}|{}",
            flag,
            host,
            req.uri().path(),
            req.uri().query().unwrap_or(""),
            req.headers().contains_key(X_REPROXY_URL),
        );
        Ok(Response::builder()
            .status(204)
            .header("foo", "bar")
            .body(Body::from(body))
            .unwrap())
    }

    async fn body_string(response: Response<Body>) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_merges_proxied_response() {
        let exchange = Exchange::capture(&Request::new(()));
        let mut response = signalled("http://foo/bar?a=b");
        response.headers_mut().insert("foo", HeaderValue::from_static("a"));
        response.headers_mut().insert("bar", HeaderValue::from_static("baz"));

        let strategy = SelfDispatch::to(tower::service_fn(echo));
        let response = strategy.decorate(exchange, response, context()).await.unwrap();

        assert_eq!(response.status(), 204);
        assert_eq!(response.headers()["foo"], "bar");
        assert_eq!(response.headers()["bar"], "baz");
        assert!(response.headers().get(X_REPROXY_URL).is_none());
        assert_eq!(body_string(response).await, "1|foo|/bar|a=b|false");
    }

    #[tokio::test]
    async fn test_hop_limit() {
        let mut request = Request::new(());
        request.extensions_mut().insert(Redispatched { hops: 3 });
        let exchange = Exchange::capture(&request);

        let strategy = SelfDispatch::to(tower::service_fn(echo)).max_hops(3);
        let err = strategy
            .decorate(exchange, signalled("http://foo/bar"), context())
            .await
            .unwrap_err();
        assert!(matches!(err, ReproxyError::HopLimitExceeded { limit: 3 }));
    }

    #[test]
    fn test_redispatch_request_clears_stale_query() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/original?stale=1")
            .header(HOST, "app.example")
            .header(CONTENT_LENGTH, "12")
            .header("cookie", "session=abc")
            .body(())
            .unwrap();
        let url = Url::parse("http://cache.internal:8081/objects/7").unwrap();

        let redispatched = redispatch_request(Exchange::capture(&request), &url, 1).unwrap();

        assert_eq!(redispatched.method(), Method::GET);
        assert_eq!(redispatched.uri(), "/objects/7");
        assert_eq!(redispatched.headers()[HOST], "cache.internal:8081");
        assert_eq!(redispatched.headers()["cookie"], "session=abc");
        assert_eq!(redispatched.headers()[X_REPROXIED], "1");
        assert!(redispatched.headers().get(CONTENT_LENGTH).is_none());
        assert_eq!(
            redispatched.extensions().get::<Redispatched>(),
            Some(&Redispatched { hops: 1 })
        );
    }

    #[test]
    fn test_redispatch_request_keeps_mount() {
        let mut request = Request::new(());
        request.extensions_mut().insert(MountPath::new("/bar"));
        let url = Url::parse("http://foo/bar/baz").unwrap();

        let redispatched = redispatch_request(Exchange::capture(&request), &url, 1).unwrap();

        assert_eq!(redispatched.uri().path(), "/baz");
        assert_eq!(
            redispatched.extensions().get::<MountPath>(),
            Some(&MountPath::new("/bar"))
        );
    }

    #[test]
    fn test_strip_mount() {
        assert_eq!(strip_mount("/bar", "/bar/baz"), "/baz");
        assert_eq!(strip_mount("/bar/", "/bar/baz"), "/baz");
        assert_eq!(strip_mount("/bar", "/bar"), "/");
        assert_eq!(strip_mount("/bar", "/barn/owl"), "/barn/owl");
        assert_eq!(strip_mount("/bar", "/baz"), "/baz");
        assert_eq!(strip_mount("", "/baz"), "/baz");
    }
}
