//! Image recompression.
//!
//! # Data Flow
//! ```text
//! FetchedResource
//!     → gate.rs       (is recompression worthwhile?)
//!     → compressor.rs (decode → grayscale? → JPEG | WebP)
//!     → Compressed { output, headers }
//! ```
//!
//! # Design Decisions
//! - Gate and compressor are traits so the pipeline can run with fakes
//! - Encoding is CPU-bound; the pipeline runs it on the blocking pool

pub mod compressor;
pub mod error;
pub mod gate;

pub use compressor::{Compressed, Compressor, ImageCompressor};
pub use error::CompressError;
pub use gate::{CompressionGate, ThresholdGate};
