//! Request/response-style host adapter.
//!
//! # Responsibilities
//! - Set each reply header individually on a mutable response
//! - Write the raw body (no base64) with a status-then-send call
//! - Send failures through the same writer, never as a bare value
//!
//! # Design Decisions
//! - Hop-by-hop headers from upstream are stripped
//! - Headers the host rejects as invalid are skipped and logged

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;

use crate::http::adapter::HostAdapter;
use crate::pipeline::Reply;

const HOP_BY_HOP: [&str; 7] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// A mutable response object in the `setHeader` / `status` / `send` style.
pub trait ResponseWriter {
    type Sent;

    fn set_header(&mut self, name: &str, value: &str);

    fn status(&mut self, status: StatusCode);

    /// Finish the response with `body`.
    fn send(self, body: Bytes) -> Self::Sent;
}

/// [`ResponseWriter`] producing an axum [`Response`].
#[derive(Debug, Default)]
pub struct AxumResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
}

impl AxumResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResponseWriter for AxumResponseWriter {
    type Sent = Response;

    fn set_header(&mut self, name: &str, value: &str) {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "Skipping invalid response header"),
        }
    }

    fn status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn send(self, body: Bytes) -> Response {
        let mut response = Response::new(Body::from(body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Drives a [`ResponseWriter`] from a pipeline [`Reply`].
#[derive(Debug)]
pub struct DirectAdapter<W> {
    writer: W,
}

impl<W: ResponseWriter> DirectAdapter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: ResponseWriter> HostAdapter for DirectAdapter<W> {
    type Output = W::Sent;

    fn reply(mut self, reply: Reply) -> W::Sent {
        for (name, value) in &reply.headers {
            if HOP_BY_HOP.contains(&name.as_str()) {
                continue;
            }
            self.writer.set_header(name, value);
        }
        self.writer.status(reply.status);
        self.writer.send(reply.body)
    }
}
