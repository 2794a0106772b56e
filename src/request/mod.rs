//! Inbound request resolution.
//!
//! # Data Flow
//! ```text
//! host-specific request (query + headers)
//!     → InboundRequest (host-neutral)
//!     → target.rs   (target URL extraction and normalization)
//!     → options.rs  (webp / grayscale / quality)
//!     → forward.rs  (allow-listed headers for the upstream fetch)
//!     → RequestContext
//! ```

pub mod forward;
pub mod options;
pub mod target;

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::config::OptionsConfig;

pub use forward::{pick_forwarded, FORWARDED_HEADERS};
pub use options::{resolve_options, CompressionOptions};
pub use target::{resolve_url, UrlResolution, IDENTITY_BODY};

/// A query parameter value: hosts deliver either one string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    Single(String),
    Multi(Vec<String>),
}

impl QueryValue {
    /// First value, if any.
    pub fn first(&self) -> Option<&str> {
        match self {
            QueryValue::Single(v) => Some(v),
            QueryValue::Multi(values) => values.first().map(String::as_str),
        }
    }

    /// All values in order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            QueryValue::Single(v) => vec![v.as_str()],
            QueryValue::Multi(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

/// Ordered query parameters. Repeated keys are folded into one `Multi` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, QueryValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw `key=value` pairs, preserving first-seen key order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.push(key.into(), value.into());
        }
        params
    }

    fn push(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => {
                let folded = match std::mem::replace(existing, QueryValue::Multi(Vec::new())) {
                    QueryValue::Single(first) => vec![first, value],
                    QueryValue::Multi(mut values) => {
                        values.push(value);
                        values
                    }
                };
                *existing = QueryValue::Multi(folded);
            }
            None => self.entries.push((key, QueryValue::Single(value))),
        }
    }

    /// Insert a whole value, replacing any previous entry for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: QueryValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// First value for `key`.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(QueryValue::first)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, QueryValue)> for QueryParams {
    fn from_iter<T: IntoIterator<Item = (String, QueryValue)>>(iter: T) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

/// Host-neutral view of an inbound invocation.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    pub query: QueryParams,
    pub headers: HeaderMap,
}

impl InboundRequest {
    pub fn new(query: QueryParams, headers: HeaderMap) -> Self {
        Self { query, headers }
    }

    /// The proxy's own host as seen by the client.
    pub fn host(&self) -> String {
        self.headers
            .get(axum::http::header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }
}

/// Everything the pipeline needs to serve one image.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Normalized upstream image URL.
    pub url: String,
    /// Allow-listed headers sent upstream.
    pub forwarded: HeaderMap,
    pub options: CompressionOptions,
    /// The proxy's own host, used to patch CSP headers.
    pub host: String,
}

/// Outcome of request resolution.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// No `url` parameter: answer with the identity body, fetch nothing.
    MissingUrl,
    Ready(RequestContext),
}

/// Resolve an inbound request into a [`RequestContext`].
pub fn resolve(request: &InboundRequest, config: &OptionsConfig) -> Resolution {
    let url = match resolve_url(&request.query, config.strategy) {
        UrlResolution::Missing => return Resolution::MissingUrl,
        UrlResolution::Target(url) => url,
    };

    Resolution::Ready(RequestContext {
        url,
        forwarded: pick_forwarded(&request.headers),
        options: resolve_options(config, &request.headers, &request.query),
        host: request.host(),
    })
}
