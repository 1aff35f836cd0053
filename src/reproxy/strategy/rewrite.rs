//! Rewrite-headers strategy (Lighttpd).
//!
//! Requires `proxy-core.allow-x-rewrite = "enable"` in the lighty config.

use axum::{
    body::Body,
    http::{HeaderValue, Response},
};
use futures_util::future::{self, BoxFuture, FutureExt};

use super::{marker::mark, request_target, Context, Strategy};
use crate::error::ReproxyError;
use crate::reproxy::{Exchange, X_REWRITE_HOST, X_REWRITE_URI};

/// Marker plus `X-Rewrite-Host` and `X-Rewrite-URI` split from the signal URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct RewriteHeaders;

fn rewrite(response: Response<Body>, context: &Context) -> Result<Response<Body>, ReproxyError> {
    let url = context.target(response.headers())?;
    let host = url.host_str().ok_or_else(|| ReproxyError::MissingHost {
        value: url.to_string(),
    })?;

    let mut response = mark(response);
    let headers = response.headers_mut();
    headers.insert(X_REWRITE_HOST, HeaderValue::from_str(host)?);
    headers.insert(X_REWRITE_URI, HeaderValue::try_from(request_target(&url))?);
    Ok(response)
}

impl Strategy for RewriteHeaders {
    fn name(&self) -> &'static str {
        "lighttpd"
    }

    fn decorate(
        &self,
        _exchange: Exchange,
        response: Response<Body>,
        context: Context,
    ) -> BoxFuture<'static, Result<Response<Body>, ReproxyError>> {
        future::ready(rewrite(response, &context)).boxed()
    }
}
