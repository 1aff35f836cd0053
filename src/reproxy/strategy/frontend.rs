//! Strategy selected from configuration.

use axum::{body::Body, http::Response};
use futures_util::future::BoxFuture;

use super::{AccelRedirect, Context, Marker, RewriteHeaders, SelfDispatch, Strategy};
use crate::config::{FrontendKind, ReproxyConfig};
use crate::error::ReproxyError;
use crate::reproxy::Exchange;

/// One of the built-in strategies, chosen at construction time.
#[derive(Debug, Clone)]
pub enum Frontend {
    Apache(Marker),
    Nginx(AccelRedirect),
    Lighttpd(RewriteHeaders),
    Rack(SelfDispatch),
}

impl Frontend {
    pub fn from_config(config: &ReproxyConfig) -> Result<Self, ReproxyError> {
        Ok(match config.frontend {
            FrontendKind::Apache => Frontend::Apache(Marker),
            FrontendKind::Nginx => Frontend::Nginx(AccelRedirect::new(&config.location)?),
            FrontendKind::Lighttpd => Frontend::Lighttpd(RewriteHeaders),
            FrontendKind::Rack => Frontend::Rack(SelfDispatch::new().max_hops(config.max_hops)),
        })
    }
}

impl Strategy for Frontend {
    fn name(&self) -> &'static str {
        match self {
            Frontend::Apache(s) => s.name(),
            Frontend::Nginx(s) => s.name(),
            Frontend::Lighttpd(s) => s.name(),
            Frontend::Rack(s) => s.name(),
        }
    }

    fn decorate(
        &self,
        exchange: Exchange,
        response: Response<Body>,
        context: Context,
    ) -> BoxFuture<'static, Result<Response<Body>, ReproxyError>> {
        match self {
            Frontend::Apache(s) => s.decorate(exchange, response, context),
            Frontend::Nginx(s) => s.decorate(exchange, response, context),
            Frontend::Lighttpd(s) => s.decorate(exchange, response, context),
            Frontend::Rack(s) => s.decorate(exchange, response, context),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let mut config = ReproxyConfig::default();
        assert_eq!(Frontend::from_config(&config).unwrap().name(), "apache");

        config.frontend = FrontendKind::Rack;
        config.max_hops = 4;
        let frontend = Frontend::from_config(&config).unwrap();
        assert_eq!(frontend.name(), "rack");

        config.frontend = FrontendKind::Nginx;
        config.location = "/bad\r\n".into();
        assert!(Frontend::from_config(&config).is_err());
    }
}
