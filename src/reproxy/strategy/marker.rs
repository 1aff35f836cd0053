//! Passthrough-marker strategy (Apache with mod_reproxy).
//!
//! The front-end reads `X-Reproxy-Url` itself; we only confirm the reproxy
//! and drop the body.

use axum::{
    body::Body,
    http::{header::CONTENT_LENGTH, HeaderValue, Response},
};
use futures_util::future::{self, BoxFuture, FutureExt};

use super::{Context, Strategy};
use crate::error::ReproxyError;
use crate::reproxy::{Exchange, X_REPROXIED};

/// Keeps the signal header, adds `X-Reproxied: 1`, empties the body.
#[derive(Debug, Clone, Copy, Default)]
pub struct Marker;

/// Base decoration shared by every strategy.
pub fn mark(response: Response<Body>) -> Response<Body> {
    let (mut parts, _body) = response.into_parts();
    parts.headers.remove(CONTENT_LENGTH);
    parts.headers.insert(X_REPROXIED, HeaderValue::from_static("1"));
    Response::from_parts(parts, Body::empty())
}

impl Strategy for Marker {
    fn name(&self) -> &'static str {
        "apache"
    }

    fn decorate(
        &self,
        _exchange: Exchange,
        response: Response<Body>,
        _context: Context,
    ) -> BoxFuture<'static, Result<Response<Body>, ReproxyError>> {
        future::ready(Ok(mark(response))).boxed()
    }
}
