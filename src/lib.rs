//! Bandwidth-saving image proxy library.
//!
//! Fetches a remote image, optionally recompresses it (grayscale, WebP or
//! quality-reduced JPEG) and returns it through one of two host adapters.

pub mod compress;
pub mod config;
pub mod error;
pub mod headers;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod request;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use error::{ProxyError, ProxyResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::{Pipeline, Reply};
