//! The reproxy interceptor as a tower layer.
//!
//! # Responsibilities
//! - Strip client-supplied reproxy signals before the inner service runs
//! - Tell the inner service which header to set (`SignalHeader` extension)
//! - Detect a reproxy in the inner response and hand it to the strategy
//!
//! # Design Decisions
//! - Stripping is unconditional; a spoofed signal is never an error
//! - A `ReproxyTo` body overwrites any signal header already present
//! - Responses without a signal pass through untouched

use std::task::{Context as TaskContext, Poll};

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request, Response},
};
use futures_util::future::BoxFuture;
use tower::{util::BoxCloneSyncService, Layer, Service};

use crate::config::ReproxyConfig;
use crate::error::{BoxError, ReproxyError};
use crate::reproxy::strategy::{Context, Frontend, Marker, Strategy};
use crate::reproxy::{Exchange, Redispatched, ReproxyTo, SignalHeader, X_REPROXIED, X_REPROXY_URL};

/// Layer that wraps services with [`Reproxy`].
#[derive(Debug, Clone)]
pub struct ReproxyLayer<T = Marker> {
    signal: HeaderName,
    strategy: T,
}

impl ReproxyLayer<Marker> {
    /// Passthrough-marker strategy on `X-Reproxy-Url`.
    pub fn new() -> Self {
        Self::with_strategy(Marker)
    }
}

impl Default for ReproxyLayer<Marker> {
    fn default() -> Self {
        Self::new()
    }
}

impl ReproxyLayer<Frontend> {
    pub fn from_config(config: &ReproxyConfig) -> Result<Self, ReproxyError> {
        let signal = HeaderName::try_from(config.header.as_str())?;
        Ok(Self::with_strategy(Frontend::from_config(config)?).header(signal))
    }
}

impl<T> ReproxyLayer<T> {
    pub fn with_strategy(strategy: T) -> Self {
        Self {
            signal: X_REPROXY_URL,
            strategy,
        }
    }

    /// Use a different signal header.
    pub fn header(mut self, signal: HeaderName) -> Self {
        self.signal = signal;
        self
    }

    pub fn signal(&self) -> &HeaderName {
        &self.signal
    }

    pub fn strategy(&self) -> &T {
        &self.strategy
    }
}

impl<S, T: Clone> Layer<S> for ReproxyLayer<T> {
    type Service = Reproxy<S, T>;

    fn layer(&self, inner: S) -> Self::Service {
        Reproxy {
            inner,
            signal: self.signal.clone(),
            strategy: self.strategy.clone(),
        }
    }
}

/// Service that resolves reproxy signals from its inner service.
#[derive(Debug, Clone)]
pub struct Reproxy<S, T = Marker> {
    inner: S,
    signal: HeaderName,
    strategy: T,
}

impl<S, T> Reproxy<S, T> {
    pub fn new(inner: S, strategy: T) -> Self {
        Self {
            inner,
            signal: X_REPROXY_URL,
            strategy,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }
}

impl<S, T> Reproxy<S, T>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
    S::Error: Into<BoxError>,
    T: Strategy,
{
    /// Neutralize anything a client could use to forge a reproxy.
    fn scrub(&self, request: &mut Request<Body>) {
        if request.headers_mut().remove(&self.signal).is_some() {
            tracing::warn!(header = %self.signal, uri = %request.uri(), "Stripped client-supplied reproxy header");
            metrics::counter!("reproxy_spoof_stripped_total").increment(1);
        }

        let internal = request.extensions().get::<Redispatched>().is_some();
        if !internal && request.headers_mut().remove(X_REPROXIED).is_some() {
            tracing::warn!(uri = %request.uri(), "Stripped client-supplied X-Reproxied flag");
            metrics::counter!("reproxy_spoof_stripped_total").increment(1);
        }

        if request.extensions().get::<SignalHeader>().is_none() {
            request
                .extensions_mut()
                .insert(SignalHeader(self.signal.clone()));
        }
    }

    async fn intercept(
        self,
        exchange: Exchange,
        response: Response<Body>,
    ) -> Result<Response<Body>, ReproxyError> {
        let (mut parts, body) = response.into_parts();

        let body = match parts.extensions.remove::<ReproxyTo>() {
            Some(ReproxyTo(url)) => {
                parts
                    .headers
                    .insert(self.signal.clone(), HeaderValue::try_from(url.as_str())?);
                Body::empty()
            }
            None if parts.headers.contains_key(&self.signal) => body,
            None => return Ok(Response::from_parts(parts, body)),
        };

        let frontend = self.strategy.name();
        tracing::debug!(
            frontend,
            method = %exchange.method,
            uri = %exchange.uri,
            target = ?parts.headers.get(&self.signal),
            "Reproxy requested"
        );
        metrics::counter!("reproxy_dispatch_total", "frontend" => frontend).increment(1);

        let strategy = self.strategy.clone();
        let context = Context::new(self.signal.clone(), BoxCloneSyncService::new(self));
        strategy
            .decorate(exchange, Response::from_parts(parts, body), context)
            .await
    }
}

impl<S, T> Service<Request<Body>> for Reproxy<S, T>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
    S::Error: Into<BoxError>,
    T: Strategy,
{
    type Response = Response<Body>;
    type Error = ReproxyError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner
            .poll_ready(cx)
            .map_err(|e| ReproxyError::Inner(e.into()))
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        // Keep the service that was driven to readiness for this call.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let this = self.clone();

        Box::pin(async move {
            this.scrub(&mut request);
            let exchange = Exchange::capture(&request);
            let response = inner
                .call(request)
                .await
                .map_err(|e| ReproxyError::Inner(e.into()))?;
            this.intercept(exchange, response).await
        })
    }
}
