//! Image compressor.
//!
//! Decodes the source with the `image` crate, optionally converts it to
//! grayscale and re-encodes it as JPEG (`image`) or lossy WebP (`webp`).

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage};

use super::error::CompressError;
use crate::request::CompressionOptions;

/// Original size of the source, in bytes.
pub const X_ORIGINAL_SIZE: HeaderName = HeaderName::from_static("x-original-size");
/// Bytes saved by recompression; negative when the output grew.
pub const X_BYTES_SAVED: HeaderName = HeaderName::from_static("x-bytes-saved");

/// Recompressed output and the headers that override the upstream ones.
#[derive(Debug, Clone)]
pub struct Compressed {
    pub output: Vec<u8>,
    pub headers: HeaderMap,
}

/// Recompression capability.
///
/// Implementations are CPU-bound and may block; callers run them on the
/// blocking pool.
pub trait Compressor: Send + Sync + 'static {
    fn compress(
        &self,
        input: &[u8],
        options: CompressionOptions,
        original_size: usize,
    ) -> Result<Compressed, CompressError>;
}

/// `image` + `webp` backed compressor.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCompressor;

impl Compressor for ImageCompressor {
    fn compress(
        &self,
        input: &[u8],
        options: CompressionOptions,
        original_size: usize,
    ) -> Result<Compressed, CompressError> {
        let img = image::load_from_memory(input)?;
        let img = if options.grayscale { img.grayscale() } else { img };

        let (output, format) = if options.use_webp {
            (encode_webp(&img, options.quality)?, "webp")
        } else {
            (encode_jpeg(&img, options.quality)?, "jpeg")
        };

        let mut headers = HeaderMap::new();
        let content_type = HeaderValue::from_str(&format!("image/{format}"))
            .map_err(|e| CompressError::encode(format, e.to_string()))?;
        headers.insert(header::CONTENT_TYPE, content_type);
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(output.len()));
        headers.insert(X_ORIGINAL_SIZE, HeaderValue::from(original_size));
        headers.insert(
            X_BYTES_SAVED,
            HeaderValue::from(original_size as i64 - output.len() as i64),
        );

        Ok(Compressed { output, headers })
    }
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CompressError> {
    let mut output = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut output, quality);
        // JPEG has no alpha channel: flatten to luma or RGB.
        let result = match img.color() {
            ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16 => {
                let luma = img.to_luma8();
                encoder.encode(luma.as_raw(), luma.width(), luma.height(), ColorType::L8)
            }
            _ => {
                let rgb = img.to_rgb8();
                encoder.encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
            }
        };
        result.map_err(|e| CompressError::encode("jpeg", e.to_string()))?;
    }
    Ok(output)
}

fn encode_webp(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CompressError> {
    let quality = f32::from(quality);
    let encoded = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
            .encode_simple(false, quality)
            .map(|memory| memory.to_vec())
    } else {
        let rgb = img.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height())
            .encode_simple(false, quality)
            .map(|memory| memory.to_vec())
    };

    encoded.map_err(|e| CompressError::encode("webp", format!("{:?}", e)))
}
