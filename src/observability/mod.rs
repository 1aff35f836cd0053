//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Interceptor and server produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (reproxy counters)
//!
//! Consumers:
//!     → stdout (tracing-subscriber fmt layer)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level
//! - Metrics are cheap (atomic increments); no recorder installed means no-op

pub mod logging;
pub mod metrics;
