//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum::serve, graceful shutdown)
//!     → middleware/metrics.rs (count client-facing responses)
//!     → HandleErrorLayer (ReproxyError → response)
//!     → ReproxyLayer (scrub, detect, decorate / redispatch)
//!     → app.rs (axum Router: /files, /storage, /health)
//! ```

pub mod app;
pub mod middleware;
pub mod server;

pub use server::{AppService, HttpServer, ServerError};
