//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the application router and its per-route middleware
//! - Wrap the whole router in the reproxy layer, so self-dispatch loops back
//!   through every route and not just the one that signalled
//! - Bind server to listener and drain on shutdown

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    extract::Request,
    middleware,
    response::Response,
    ServiceExt,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::{util::BoxCloneSyncService, ServiceBuilder};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::error::ReproxyError;
use crate::http::{app, middleware::metrics::record_metrics};
use crate::reproxy::ReproxyLayer;

/// The complete, type-erased service handed to `axum::serve`.
pub type AppService = BoxCloneSyncService<Request, Response, Infallible>;

/// Errors building the server from configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid reproxy settings: {0}")]
    Reproxy(#[from] ReproxyError),

    #[error("invalid storage url: {0}")]
    StorageUrl(#[from] url::ParseError),
}

/// HTTP server for the reproxy application.
pub struct HttpServer {
    service: AppService,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let service = Self::build_service(&config)?;
        Ok(Self { service, config })
    }

    #[allow(deprecated)]
    fn build_service(config: &ServerConfig) -> Result<AppService, ServerError> {
        let router = app::router(&config.app)?
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http());

        let service = ServiceBuilder::new()
            .layer(middleware::from_fn(record_metrics))
            .layer(HandleErrorLayer::new(|err: ReproxyError| async move { err }))
            .layer(ReproxyLayer::from_config(&config.reproxy)?)
            .service(router);

        Ok(BoxCloneSyncService::new(service))
    }

    /// The request pipeline, for driving in-process.
    pub fn service(&self) -> AppService {
        self.service.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            frontend = ?self.config.reproxy.frontend,
            header = %self.config.reproxy.header,
            "HTTP server starting"
        );

        let app = ServiceExt::<Request>::into_make_service(self.service);
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
