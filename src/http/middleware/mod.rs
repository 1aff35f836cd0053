//! Axum middleware functions.

pub mod metrics;
