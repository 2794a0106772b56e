//! Upstream image fetching.
//!
//! # Data Flow
//! ```text
//! RequestContext (url + allow-listed headers)
//!     → Fetcher::fetch (single GET, no retries)
//!     → FetchOutcome::Fetched (bytes, content-type, headers)
//!     | FetchOutcome::Status  (non-success status, passed through)
//!     | ProxyError            (network failure or timeout)
//! ```

pub mod fetcher;

pub use fetcher::{FetchOutcome, FetchedResource, Fetcher, HttpFetcher};
