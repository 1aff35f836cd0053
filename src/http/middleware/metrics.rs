//! Response accounting middleware.

use axum::{extract::Request, middleware::Next, response::Response};

use crate::observability::metrics;

/// Counts every response returned to the client, reproxy errors included.
pub async fn record_metrics(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;
    let status = response.status();
    metrics::record_response(status.as_u16());

    if status.is_server_error() {
        tracing::warn!(method = %method, path = %path, status = %status, "Request failed");
    }
    response
}
