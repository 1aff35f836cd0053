//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the reproxy server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Reproxy interceptor settings.
    pub reproxy: ReproxyConfig,

    /// Demo application settings.
    pub app: AppConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Which front-end will stream the reproxied bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FrontendKind {
    /// mod_reproxy reads `X-Reproxy-Url` directly.
    #[default]
    Apache,
    /// Internal redirect via `X-Accel-Redirect`.
    Nginx,
    /// `X-Rewrite-Host` / `X-Rewrite-URI`.
    Lighttpd,
    /// In-process redispatch.
    Rack,
}

/// Reproxy interceptor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReproxyConfig {
    /// Signal header name.
    pub header: String,

    /// Front-end strategy.
    pub frontend: FrontendKind,

    /// Nginx internal location.
    pub location: String,

    /// Maximum self-dispatch chain length (rack only).
    pub max_hops: u32,
}

impl Default for ReproxyConfig {
    fn default() -> Self {
        Self {
            header: "X-Reproxy-Url".to_string(),
            frontend: FrontendKind::default(),
            location: "/reproxy".to_string(),
            max_hops: 16,
        }
    }
}

/// Demo application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL that `/files/{key}` reproxies to. Must end with `/`.
    ///
    /// The default points at this server's own `/storage/`, which only
    /// answers in-process re-dispatches, so it is only usable with the
    /// `rack` front-end. With `apache`, `nginx` or `lighttpd` the front-end
    /// fetches this URL itself and the layer strips its `X-Reproxied`; point
    /// it at a separate private service reachable only by the front-end.
    pub storage_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_url: "http://127.0.0.1:8080/storage/".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml() {
        let config: ServerConfig = toml::from_str(
            r#"
            [reproxy]
            frontend = "lighttpd"
            "#,
        )
        .unwrap();

        assert_eq!(config.reproxy.frontend, FrontendKind::Lighttpd);
        assert_eq!(config.reproxy.header, "X-Reproxy-Url");
        assert_eq!(config.reproxy.max_hops, 16);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn test_unknown_frontend_rejected() {
        let result: Result<ServerConfig, _> = toml::from_str(
            r#"
            [reproxy]
            frontend = "caddy"
            "#,
        );
        assert!(result.is_err());
    }
}
