//! The request pipeline shared by both host adapters.
//!
//! ```text
//! InboundRequest
//!     → request::resolve        (url, options, forwarded headers)
//!     → Fetcher::fetch          (single GET)
//!     → CompressionGate         (bypass | compress, exactly one)
//!     → Compressor              (blocking pool, bounded by a timeout)
//!     → headers::patch_headers  (CSP rewrite + flatten)
//!     → Reply
//! ```
//!
//! The pipeline holds no per-request state; every collaborator is injected
//! so the whole chain can run against fakes.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use tokio::time::timeout;

use crate::compress::{Compressed, CompressionGate, Compressor, ImageCompressor, ThresholdGate};
use crate::config::{OptionsConfig, ProxyConfig};
use crate::error::{ProxyError, ProxyResult};
use crate::headers::{self, FlatHeaders};
use crate::observability::{PipelineObserver, TracingObserver};
use crate::request::{self, CompressionOptions, InboundRequest, Resolution, IDENTITY_BODY};
use crate::upstream::{FetchOutcome, Fetcher, HttpFetcher};

/// Marks a response whose body is the untouched upstream image.
pub const X_PROXY_BYPASS: HeaderName = HeaderName::from_static("x-proxy-bypass");

/// Host-neutral response produced by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: FlatHeaders,
    pub body: Bytes,
    /// Body is image bytes rather than text.
    pub binary: bool,
}

impl Reply {
    /// Answer for requests without a `url` parameter.
    pub fn identity() -> Self {
        Self::text(StatusCode::OK, IDENTITY_BODY.to_string())
    }

    /// Upstream status passed through with an empty body.
    pub fn upstream_status(status: StatusCode) -> Self {
        Self::text(status, String::new())
    }

    /// Uniform 500 for any pipeline failure.
    pub fn error(error: &ProxyError) -> Self {
        Self::text(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
    }

    fn text(status: StatusCode, body: String) -> Self {
        Self {
            status,
            headers: FlatHeaders::new(),
            body: Bytes::from(body),
            binary: false,
        }
    }

    fn image(headers: FlatHeaders, body: Bytes) -> Self {
        Self {
            status: StatusCode::OK,
            headers,
            body,
            binary: true,
        }
    }
}

/// Fetch → gate → (bypass | compress) → patch.
pub struct Pipeline {
    options: OptionsConfig,
    compress_timeout_secs: u64,
    fetcher: Arc<dyn Fetcher>,
    gate: Arc<dyn CompressionGate>,
    compressor: Arc<dyn Compressor>,
    observer: Arc<dyn PipelineObserver>,
}

impl Pipeline {
    /// Pipeline with the given fetcher and the default gate, compressor and
    /// observer for `config`.
    pub fn new(config: &ProxyConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            options: config.options.clone(),
            compress_timeout_secs: config.timeouts.compress_secs,
            fetcher,
            gate: Arc::new(ThresholdGate::new(&config.compression)),
            compressor: Arc::new(ImageCompressor),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Production pipeline: `reqwest` fetcher bounded by `timeouts.fetch_secs`.
    pub fn from_config(config: &ProxyConfig) -> ProxyResult<Self> {
        let fetcher = HttpFetcher::new(config.timeouts.fetch_secs)?;
        Ok(Self::new(config, Arc::new(fetcher)))
    }

    pub fn with_gate(mut self, gate: Arc<dyn CompressionGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_compressor(mut self, compressor: Arc<dyn Compressor>) -> Self {
        self.compressor = compressor;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Serve one request. Errors are left for the host adapter to map.
    pub async fn handle(&self, request: &InboundRequest) -> ProxyResult<Reply> {
        let ctx = match request::resolve(request, &self.options) {
            Resolution::MissingUrl => return Ok(Reply::identity()),
            Resolution::Ready(ctx) => ctx,
        };

        let fetched = match self.fetcher.fetch(&ctx.url, ctx.forwarded.clone()).await {
            Ok(FetchOutcome::Fetched(resource)) => resource,
            Ok(FetchOutcome::Status(status)) => {
                self.observer.upstream_status(&ctx.url, status);
                return Ok(Reply::upstream_status(status));
            }
            Err(e) => {
                self.observer.fetch_failed(&ctx.url, &e);
                return Err(e);
            }
        };

        let original_size = fetched.size();
        if !self
            .gate
            .should_compress(&fetched.content_type, original_size, ctx.options.use_webp)
        {
            self.observer
                .bypassed(&ctx.url, &fetched.content_type, original_size);
            let mut upstream_headers = fetched.headers;
            upstream_headers.insert(X_PROXY_BYPASS, HeaderValue::from_static("1"));
            return Ok(Reply::image(
                headers::patch_headers(&upstream_headers, &ctx.host),
                fetched.body,
            ));
        }

        let compressed = self
            .compress(&ctx.url, fetched.body, ctx.options, original_size)
            .await?;

        let output_size = compressed.output.len();
        let ratio = (original_size as f64 - output_size as f64) / original_size as f64;
        self.observer
            .compressed(&ctx.url, original_size, output_size, ratio);

        // Freshly encoded body: upstream framing and encoding no longer apply.
        let mut upstream_headers = fetched.headers;
        upstream_headers.remove(header::CONTENT_LENGTH);
        upstream_headers.remove(header::CONTENT_ENCODING);
        let merged = headers::merge(upstream_headers, &compressed.headers);

        Ok(Reply::image(
            headers::patch_headers(&merged, &ctx.host),
            Bytes::from(compressed.output),
        ))
    }

    async fn compress(
        &self,
        url: &str,
        body: Bytes,
        options: CompressionOptions,
        original_size: usize,
    ) -> ProxyResult<Compressed> {
        let compressor = Arc::clone(&self.compressor);
        let task =
            tokio::task::spawn_blocking(move || compressor.compress(&body, options, original_size));

        let result = match timeout(Duration::from_secs(self.compress_timeout_secs), task).await {
            Ok(Ok(compressed)) => compressed.map_err(ProxyError::from),
            Ok(Err(join)) => Err(ProxyError::Join(join.to_string())),
            Err(_) => Err(ProxyError::CompressionTimeout(self.compress_timeout_secs)),
        };

        if let Err(e) = &result {
            self.observer.compression_failed(url, e);
        }
        result
    }
}
