//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by host adapter and status
//! - `proxy_outcomes_total` (counter): pipeline outcomes (bypass, compressed, ...)
//! - `proxy_bytes_saved` (histogram): bytes saved per compressed image
//! - `proxy_compression_failures_total` (counter)
//! - `proxy_request_duration_seconds` (histogram): latency by host adapter

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Count a finished request and its latency.
pub fn record_request(adapter: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "adapter" => adapter,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("proxy_request_duration_seconds", "adapter" => adapter)
        .record(start.elapsed().as_secs_f64());
}

/// Record a pipeline outcome (`bypass`, `compressed`, `upstream_status`, ...).
pub fn record_outcome(outcome: &'static str) {
    metrics::counter!("proxy_outcomes_total", "outcome" => outcome).increment(1);
}

pub fn record_bytes_saved(saved: i64) {
    metrics::histogram!("proxy_bytes_saved").record(saved as f64);
}

pub fn record_compression_failure() {
    metrics::counter!("proxy_compression_failures_total").increment(1);
}
