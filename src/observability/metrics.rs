//! Metrics collection and exposition.
//!
//! # Metrics
//! - `reproxy_dispatch_total` (counter): reproxies resolved, by frontend
//! - `reproxy_spoof_stripped_total` (counter): client-supplied signals removed
//! - `reproxy_requests_total` (counter): requests served, by status

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint. Requires a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Count a response leaving the server.
pub fn record_response(status: u16) {
    metrics::counter!("reproxy_requests_total", "status" => status.to_string()).increment(1);
}
