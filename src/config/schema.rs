//! TOML configuration schema.
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) yields a working proxy on `0.0.0.0:8080`.

use serde::{Deserialize, Serialize};

/// Root configuration for the image proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// How compression options are derived from a request.
    pub options: OptionsConfig,

    /// Compression gate thresholds.
    pub compression: CompressionConfig,

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

/// Which part of the request carries the compression options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OptionStrategy {
    /// `x-image-lite-*` request headers.
    #[default]
    Headers,
    /// `jpeg`, `bw` and `l` query parameters.
    Query,
}

/// Option resolution settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OptionsConfig {
    /// Active option-resolution strategy.
    pub strategy: OptionStrategy,

    /// Quality used when the request carries none (1-100).
    pub default_quality: u8,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            strategy: OptionStrategy::Headers,
            default_quality: 40,
        }
    }
}

/// Thresholds below which recompression is skipped.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Minimum size in bytes before a WebP recompression is attempted.
    pub min_compress_length: usize,

    /// Minimum size in bytes for PNG/GIF sources when encoding to JPEG.
    pub min_transparent_compress_length: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            min_compress_length: 1024,
            min_transparent_compress_length: 1024 * 100,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream image fetch timeout in seconds.
    pub fetch_secs: u64,

    /// Recompression timeout in seconds.
    pub compress_secs: u64,

    /// Bound on one whole invocation, in seconds. Must exceed
    /// `fetch_secs + compress_secs` so the inner timeouts fire first.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            fetch_secs: 30,
            compress_secs: 30,
            request_secs: 75,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
