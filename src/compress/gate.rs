//! Compression gate: decides whether recompressing is worth it.

use crate::config::CompressionConfig;

/// Decision over (content-type, size, target-is-webp).
pub trait CompressionGate: Send + Sync {
    fn should_compress(&self, content_type: &str, size: usize, use_webp: bool) -> bool;
}

/// Size/type thresholds.
///
/// PNG and GIF sources usually carry transparency that JPEG flattens, so they
/// need to be much larger before a JPEG re-encode pays off.
#[derive(Debug, Clone)]
pub struct ThresholdGate {
    min_compress_length: usize,
    min_transparent_compress_length: usize,
}

impl ThresholdGate {
    pub fn new(config: &CompressionConfig) -> Self {
        Self {
            min_compress_length: config.min_compress_length,
            min_transparent_compress_length: config.min_transparent_compress_length,
        }
    }
}

impl Default for ThresholdGate {
    fn default() -> Self {
        Self::new(&CompressionConfig::default())
    }
}

impl CompressionGate for ThresholdGate {
    fn should_compress(&self, content_type: &str, size: usize, use_webp: bool) -> bool {
        if !content_type.starts_with("image") || size == 0 {
            return false;
        }
        if use_webp && size < self.min_compress_length {
            return false;
        }
        if !use_webp
            && (content_type.ends_with("png") || content_type.ends_with("gif"))
            && size < self.min_transparent_compress_length
        {
            return false;
        }
        true
    }
}
