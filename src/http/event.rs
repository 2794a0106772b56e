//! Event-style host adapter.
//!
//! The host delivers a JSON invocation object and expects a JSON result:
//!
//! ```text
//! { "queryStringParameters": {...}, "headers": {...} }
//!     → { "statusCode": 200, "body": "<base64>", "headers": {...}, "isBase64Encoded": true }
//! ```
//!
//! Image bodies are always base64-encoded; text bodies (identity, errors) are
//! sent as-is without headers.

use std::collections::BTreeMap;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::headers::FlatHeaders;
use crate::http::adapter::HostAdapter;
use crate::pipeline::{Pipeline, Reply};
use crate::request::{InboundRequest, QueryParams, QueryValue};

/// Inbound invocation object.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyEvent {
    pub query_string_parameters: Option<BTreeMap<String, QueryValue>>,
    pub headers: Option<BTreeMap<String, String>>,
}

impl ProxyEvent {
    /// Convert to the host-neutral request. Header entries that are not valid
    /// HTTP are dropped.
    pub fn into_inbound(self) -> InboundRequest {
        let query: QueryParams = self
            .query_string_parameters
            .unwrap_or_default()
            .into_iter()
            .collect();

        let mut headers = HeaderMap::new();
        for (name, value) in self.headers.unwrap_or_default() {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => tracing::debug!(header = %name, "Dropping invalid event header"),
            }
        }

        InboundRequest::new(query, headers)
    }
}

/// Structured result returned to the event host.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub status_code: u16,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<FlatHeaders>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_base64_encoded: Option<bool>,
}

/// Builds [`EventResponse`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventAdapter;

impl HostAdapter for EventAdapter {
    type Output = EventResponse;

    fn reply(self, reply: Reply) -> EventResponse {
        if reply.binary {
            EventResponse {
                status_code: reply.status.as_u16(),
                body: STANDARD.encode(&reply.body),
                headers: Some(reply.headers),
                is_base64_encoded: Some(true),
            }
        } else {
            EventResponse {
                status_code: reply.status.as_u16(),
                body: String::from_utf8_lossy(&reply.body).into_owned(),
                headers: None,
                is_base64_encoded: None,
            }
        }
    }
}

/// Event-style entry point.
pub async fn handle_event(pipeline: &Pipeline, event: ProxyEvent) -> EventResponse {
    let request = event.into_inbound();
    EventAdapter.emit(pipeline.handle(&request).await)
}
