//! Pipeline observer: the logging capability injected into the pipeline.

use axum::http::StatusCode;

use crate::error::ProxyError;
use crate::observability::metrics;

/// Receives one callback per notable pipeline event.
pub trait PipelineObserver: Send + Sync {
    /// Upstream answered with a non-success status.
    fn upstream_status(&self, url: &str, status: StatusCode);

    /// Fetch failed at the network level or timed out.
    fn fetch_failed(&self, url: &str, error: &ProxyError);

    /// The gate declined; original bytes are returned.
    fn bypassed(&self, url: &str, content_type: &str, size: usize);

    /// Recompression succeeded. `ratio` is `(original - output) / original`.
    fn compressed(&self, url: &str, original_size: usize, output_size: usize, ratio: f64);

    /// Recompression failed; the request is about to turn into a 500.
    fn compression_failed(&self, url: &str, error: &ProxyError);
}

/// Emits `tracing` events and `metrics` updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn upstream_status(&self, url: &str, status: StatusCode) {
        tracing::warn!(url = %url, status = status.as_u16(), "Upstream returned non-success status");
        metrics::record_outcome("upstream_status");
    }

    fn fetch_failed(&self, url: &str, error: &ProxyError) {
        tracing::error!(url = %url, error = %error, "Upstream fetch failed");
        metrics::record_outcome("fetch_failed");
    }

    fn bypassed(&self, url: &str, content_type: &str, size: usize) {
        tracing::debug!(url = %url, content_type = %content_type, size, "Compression bypassed");
        metrics::record_outcome("bypass");
    }

    fn compressed(&self, url: &str, original_size: usize, output_size: usize, ratio: f64) {
        // The ratio is logged as-is with a `%` suffix; it is not scaled by 100.
        tracing::info!(
            url = %url,
            original_size,
            output_size,
            ratio,
            "Saved: {}%",
            ratio
        );
        metrics::record_outcome("compressed");
        metrics::record_bytes_saved(original_size as i64 - output_size as i64);
    }

    fn compression_failed(&self, url: &str, error: &ProxyError) {
        tracing::error!(url = %url, error = %error, "Image compression failed");
        metrics::record_compression_failure();
    }
}
