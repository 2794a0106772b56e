//! Compression option resolution.
//!
//! Two strategies exist and exactly one is active per deployment
//! (`options.strategy` in the config):
//! - headers: `x-image-lite-bw`, `x-image-lite-level`, `x-image-lite-jpeg`,
//!   all three or none
//! - query: `bw`, `l`, `jpeg`

use axum::http::HeaderMap;

use crate::config::{OptionStrategy, OptionsConfig};
use crate::request::QueryParams;

pub const HEADER_BW: &str = "x-image-lite-bw";
pub const HEADER_LEVEL: &str = "x-image-lite-level";
pub const HEADER_JPEG: &str = "x-image-lite-jpeg";

/// Query keys consumed by the query strategy.
pub const QUERY_OPTION_KEYS: [&str; 3] = ["jpeg", "bw", "l"];

/// How the fetched image should be recompressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionOptions {
    /// Encode to WebP instead of JPEG.
    pub use_webp: bool,
    pub grayscale: bool,
    /// Encoder quality, 1-100.
    pub quality: u8,
}

impl CompressionOptions {
    pub const DEFAULT_QUALITY: u8 = 40;

    fn with_quality(quality: u8) -> Self {
        Self {
            use_webp: false,
            grayscale: true,
            quality,
        }
    }
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self::with_quality(Self::DEFAULT_QUALITY)
    }
}

/// Derive options with the configured strategy.
pub fn resolve_options(
    config: &OptionsConfig,
    headers: &HeaderMap,
    query: &QueryParams,
) -> CompressionOptions {
    match config.strategy {
        OptionStrategy::Headers => from_headers(headers, config.default_quality),
        OptionStrategy::Query => from_query(query, config.default_quality),
    }
}

fn from_headers(headers: &HeaderMap, default_quality: u8) -> CompressionOptions {
    let get = |name: &str| headers.get(name).map(|v| String::from_utf8_lossy(v.as_bytes()));

    match (get(HEADER_BW), get(HEADER_LEVEL), get(HEADER_JPEG)) {
        (Some(bw), Some(level), Some(jpeg)) => CompressionOptions {
            use_webp: jpeg == "0",
            grayscale: bw != "0",
            quality: parse_quality(Some(&level), default_quality),
        },
        _ => CompressionOptions::with_quality(default_quality),
    }
}

fn from_query(query: &QueryParams, default_quality: u8) -> CompressionOptions {
    let jpeg = query.first("jpeg");
    CompressionOptions {
        use_webp: matches!(jpeg, None | Some("0")),
        grayscale: query.first("bw") != Some("0"),
        quality: parse_quality(query.first("l"), default_quality),
    }
}

/// Leading-integer parse: `"55abc"` is 55. Zero, garbage or absent falls back
/// to `default`; anything else is clamped into 1..=100.
fn parse_quality(raw: Option<&str>, default: u8) -> u8 {
    let Some(raw) = raw else {
        return default;
    };
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return default;
    }

    // Saturate instead of overflowing on absurdly long inputs.
    let magnitude = digits[..end].parse::<u64>().unwrap_or(u64::MAX);
    match (negative, magnitude) {
        (_, 0) => default,
        (true, _) => 1,
        (false, m) => m.min(100) as u8,
    }
}
