//! Reproxy interception subsystem.
//!
//! # Data Flow
//! ```text
//! Client request
//!     → layer.rs (strip spoofed signal, annotate SignalHeader)
//!     → inner service (handler / Router)
//!     → layer.rs (ReproxyTo body? signal header? otherwise pass through)
//!     → strategy/ (decorate for the front-end that streams the bytes)
//!         apache:   X-Reproxied marker only
//!         nginx:    + X-Accel-Redirect internal location
//!         lighttpd: + X-Rewrite-Host / X-Rewrite-URI
//!         rack:     synthesize request, redispatch, merge headers
//!     → Client response
//! ```
//!
//! # Design Decisions
//! - One interceptor, strategy chosen at construction time
//! - All per-request flags ride on typed request extensions
//! - Self-dispatch loops back through the interceptor so chains resolve

use axum::http::HeaderName;

pub mod exchange;
pub mod layer;
pub mod strategy;

pub use exchange::{Exchange, MountPath, Redispatched, ReproxyTo, SignalHeader};
pub use layer::{Reproxy, ReproxyLayer};
pub use strategy::{
    AccelRedirect, Context, Frontend, Loopback, Marker, RewriteHeaders, SelfDispatch, Strategy,
};

/// Default signal header: the inner handler sets it to request a reproxy.
pub const X_REPROXY_URL: HeaderName = HeaderName::from_static("x-reproxy-url");

/// Confirmation marker on reproxied responses, and the in-band flag on
/// redispatched requests. Always `"1"`.
pub const X_REPROXIED: HeaderName = HeaderName::from_static("x-reproxied");

/// Nginx internal redirect location.
pub const X_ACCEL_REDIRECT: HeaderName = HeaderName::from_static("x-accel-redirect");

/// Lighttpd rewrite target host.
pub const X_REWRITE_HOST: HeaderName = HeaderName::from_static("x-rewrite-host");

/// Lighttpd rewrite target path and query.
pub const X_REWRITE_URI: HeaderName = HeaderName::from_static("x-rewrite-uri");
