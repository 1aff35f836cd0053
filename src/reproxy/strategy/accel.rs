//! Accelerated-redirect strategy (Nginx).
//!
//! Nginx relies on an internal location that proxies to the upstream named
//! by `$upstream_http_x_reproxy_url`:
//!
//! ```text
//! location /reproxy {
//!     internal;
//!     set $reproxy_url $upstream_http_x_reproxy_url;
//!     proxy_pass $reproxy_url;
//! }
//! ```

use axum::{
    body::Body,
    http::{HeaderValue, Response},
};
use futures_util::future::{self, BoxFuture, FutureExt};

use super::{marker::mark, Context, Strategy};
use crate::error::ReproxyError;
use crate::reproxy::{Exchange, X_ACCEL_REDIRECT};

/// Marker plus `X-Accel-Redirect: <location>`.
#[derive(Debug, Clone)]
pub struct AccelRedirect {
    location: HeaderValue,
}

impl AccelRedirect {
    pub const DEFAULT_LOCATION: &'static str = "/reproxy";

    pub fn new(location: &str) -> Result<Self, ReproxyError> {
        Ok(Self {
            location: HeaderValue::from_str(location)?,
        })
    }

    pub fn location(&self) -> &HeaderValue {
        &self.location
    }
}

impl Default for AccelRedirect {
    fn default() -> Self {
        Self {
            location: HeaderValue::from_static(Self::DEFAULT_LOCATION),
        }
    }
}

impl Strategy for AccelRedirect {
    fn name(&self) -> &'static str {
        "nginx"
    }

    fn decorate(
        &self,
        _exchange: Exchange,
        response: Response<Body>,
        _context: Context,
    ) -> BoxFuture<'static, Result<Response<Body>, ReproxyError>> {
        let mut response = mark(response);
        response
            .headers_mut()
            .insert(X_ACCEL_REDIRECT, self.location.clone());
        future::ready(Ok(response)).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reproxy::strategy::test_support::{context, signalled};
    use crate::reproxy::{X_REPROXIED, X_REPROXY_URL};
    use axum::http::Request;

    #[tokio::test]
    async fn test_default_location() {
        let exchange = Exchange::capture(&Request::new(()));
        let response = AccelRedirect::default()
            .decorate(exchange, signalled("foo"), context())
            .await
            .unwrap();

        assert_eq!(response.headers()[X_REPROXY_URL], "foo");
        assert_eq!(response.headers()[X_REPROXIED], "1");
        assert_eq!(response.headers()[X_ACCEL_REDIRECT], "/reproxy");
    }

    #[tokio::test]
    async fn test_custom_location() {
        let exchange = Exchange::capture(&Request::new(()));
        let strategy = AccelRedirect::new("/internal/fetch").unwrap();
        let response = strategy
            .decorate(exchange, signalled("http://storage/a"), context())
            .await
            .unwrap();

        assert_eq!(response.headers()[X_ACCEL_REDIRECT], "/internal/fetch");
    }

    #[test]
    fn test_rejects_unencodable_location() {
        assert!(AccelRedirect::new("/bad\nlocation").is_err());
    }
}
