//! Pipeline error types.
//!
//! Every failure inside one invocation is caught once by the host adapter
//! and turned into a 500 whose body is the error's `Display` output.

use thiserror::Error;

use crate::compress::CompressError;

/// Errors that abort a proxied request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Upstream request failed at the network level.
    #[error("{0}")]
    Fetch(#[from] reqwest::Error),

    /// Upstream request did not finish in time.
    #[error("upstream fetch timed out after {0} seconds")]
    FetchTimeout(u64),

    /// The image could not be recompressed.
    #[error("{0}")]
    Compression(#[from] CompressError),

    /// Recompression did not finish in time.
    #[error("compression timed out after {0} seconds")]
    CompressionTimeout(u64),

    /// The whole invocation did not finish in time.
    #[error("request timed out after {0} seconds")]
    RequestTimeout(u64),

    /// The blocking compression task panicked or was cancelled.
    #[error("compression task failed: {0}")]
    Join(String),
}

/// Result type for pipeline operations.
pub type ProxyResult<T> = Result<T, ProxyError>;
