//! Demo application served behind the reproxy layer.
//!
//! `/files/{key}` never serves bytes itself: it answers with a deferred
//! location under the storage URL. `/storage/{key}` plays the private file
//! server and only answers internal re-dispatches, so it can only back the
//! `rack` front-end; the others need `storage_url` on a separate service.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use url::Url;

use crate::config::AppConfig;
use crate::reproxy::{ReproxyTo, X_REPROXIED};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub storage_url: Arc<Url>,
}

/// Build the application router.
pub fn router(config: &AppConfig) -> Result<Router, url::ParseError> {
    let state = AppState {
        storage_url: Arc::new(Url::parse(&config.storage_url)?),
    };

    Ok(Router::new()
        .route("/files/{*key}", get(files))
        .route("/storage/{*key}", get(storage))
        .route("/health", get(health))
        .with_state(state))
}

async fn files(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    let url = match state.storage_url.join(&key) {
        // `..` segments must not climb out of the storage prefix.
        Ok(url) if url.as_str().starts_with(state.storage_url.as_str()) => url,
        _ => {
            tracing::warn!(key = %key, "Rejected file key");
            return (StatusCode::BAD_REQUEST, "Invalid file key").into_response();
        }
    };

    tracing::debug!(key = %key, target = %url, "Deferring file to storage");
    ReproxyTo(url).into_response()
}

async fn storage(headers: HeaderMap, Path(key): Path<String>) -> Response {
    let internal = headers
        .get(X_REPROXIED)
        .map(|v| v == "1")
        .unwrap_or(false);
    if !internal {
        return (StatusCode::FORBIDDEN, "Storage is internal only").into_response();
    }

    (
        [
            (CONTENT_TYPE, "text/plain"),
            (CACHE_CONTROL, "private, max-age=60"),
        ],
        format!("object {}", key),
    )
        .into_response()
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> Router {
        router(&AppConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_files_defer_to_storage() {
        let response = app()
            .oneshot(Request::get("/files/reports/q3.pdf").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let target = response.extensions().get::<ReproxyTo>().unwrap();
        assert_eq!(target.0.as_str(), "http://127.0.0.1:8080/storage/reports/q3.pdf");
    }

    #[tokio::test]
    async fn test_files_reject_escaping_keys() {
        let response = app()
            .oneshot(Request::get("/files/%2E%2E/%2E%2E/etc").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_storage_is_internal_only() {
        let response = app()
            .oneshot(Request::get("/storage/a").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app()
            .oneshot(
                Request::get("/storage/a")
                    .header("X-Reproxied", "1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CACHE_CONTROL], "private, max-age=60");
    }
}
