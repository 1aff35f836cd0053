//! Shared helpers for integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::Response;

/// Response carrying only a signal header.
pub fn signal(url: &str) -> Response<Body> {
    Response::builder()
        .header("X-Reproxy-Url", url)
        .body(Body::from("original"))
        .unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Header value as a string, empty when missing.
pub fn header<'a>(response: &'a Response<Body>, name: &str) -> &'a str {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
