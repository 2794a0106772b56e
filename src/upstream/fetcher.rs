//! HTTP fetcher for source images.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{header, HeaderMap, StatusCode};
use tokio::time::timeout;

use crate::error::{ProxyError, ProxyResult};

/// A successfully fetched upstream resource.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub status: StatusCode,
    /// `content-type` response header, empty if absent.
    pub content_type: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl FetchedResource {
    pub fn size(&self) -> usize {
        self.body.len()
    }
}

/// What came back from upstream.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Fetched(FetchedResource),
    /// Upstream answered with a non-success status; surfaced as-is, no body.
    Status(StatusCode),
}

/// Outbound GET capability.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` sending exactly `headers`.
    async fn fetch(&self, url: &str, headers: HeaderMap) -> ProxyResult<FetchOutcome>;
}

/// `reqwest`-backed fetcher.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout_secs`.
    pub fn new(timeout_secs: u64) -> ProxyResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .tcp_nodelay(true)
            .build()?;

        Ok(Self {
            client,
            timeout_secs,
        })
    }

    /// The client-level timeout and the outer one report the same error.
    fn classify(&self, error: reqwest::Error) -> ProxyError {
        if error.is_timeout() {
            ProxyError::FetchTimeout(self.timeout_secs)
        } else {
            ProxyError::Fetch(error)
        }
    }

    async fn get(&self, url: &str, headers: HeaderMap) -> ProxyResult<FetchOutcome> {
        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Ok(FetchOutcome::Status(status));
        }

        let headers = response.headers().clone();
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .unwrap_or_default();
        let body = response.bytes().await.map_err(|e| self.classify(e))?;

        Ok(FetchOutcome::Fetched(FetchedResource {
            status,
            content_type,
            headers,
            body,
        }))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, headers: HeaderMap) -> ProxyResult<FetchOutcome> {
        match timeout(Duration::from_secs(self.timeout_secs), self.get(url, headers)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProxyError::FetchTimeout(self.timeout_secs)),
        }
    }
}
