//! Reproxy: let HTTP handlers defer response bodies to another URL.
//!
//! A handler returns [`ReproxyTo`] (or sets `X-Reproxy-Url`) and the
//! [`ReproxyLayer`] translates that into whatever the front-end streaming the
//! bytes understands: Apache mod_reproxy, Nginx `X-Accel-Redirect`, Lighttpd
//! `X-Rewrite-*`, or an in-process redispatch.
//!
//! ```text
//!  client ──▶ ReproxyLayer ──▶ handler
//!                 │  ◀── ReproxyTo(url) / X-Reproxy-Url
//!                 ▼
//!             Strategy ──▶ decorated response ──▶ front-end ──▶ upstream
//!                 │
//!                 └── rack: redispatch into the handler chain again
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod reproxy;

pub use config::ServerConfig;
pub use error::ReproxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use reproxy::{
    AccelRedirect, Frontend, Marker, Reproxy, ReproxyLayer, ReproxyTo, RewriteHeaders,
    SelfDispatch, Strategy,
};
