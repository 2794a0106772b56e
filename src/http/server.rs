//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with both host entry points
//! - Wire up middleware (tracing, request ID)
//! - Bound each invocation by `timeouts.request_secs`; an elapsed bound is a
//!   pipeline failure and goes through the host adapter like any other
//! - Bind server to listener
//! - Dispatch requests into the shared pipeline
//!
//! # Routes
//! - `GET /`        request/response-style host: raw bytes out
//! - `POST /invoke` event-style host: JSON event in, JSON result out

use axum::{
    extract::{RawQuery, State},
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::error::{ProxyError, ProxyResult};
use crate::http::adapter::HostAdapter;
use crate::http::event::{EventAdapter, EventResponse, ProxyEvent};
use crate::http::response::{AxumResponseWriter, DirectAdapter};
use crate::observability::metrics;
use crate::pipeline::{Pipeline, Reply};
use crate::request::{InboundRequest, QueryParams};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub request_timeout_secs: u64,
}

impl AppState {
    /// Run the pipeline under the per-invocation bound.
    async fn handle(&self, request: &InboundRequest) -> ProxyResult<Reply> {
        let limit = Duration::from_secs(self.request_timeout_secs);
        match tokio::time::timeout(limit, self.pipeline.handle(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProxyError::RequestTimeout(self.request_timeout_secs)),
        }
    }
}

/// HTTP server for the image proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server with the production pipeline.
    pub fn new(config: ProxyConfig) -> ProxyResult<Self> {
        let pipeline = Pipeline::from_config(&config)?;
        Ok(Self::with_pipeline(config, pipeline))
    }

    /// Create a server around an already-built pipeline.
    pub fn with_pipeline(config: ProxyConfig, pipeline: Pipeline) -> Self {
        let state = AppState {
            pipeline: Arc::new(pipeline),
            request_timeout_secs: config.timeouts.request_secs,
        };
        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", get(direct_handler))
            .route("/invoke", post(event_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            strategy = ?self.config.options.strategy,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Build the host-neutral request for `GET /`.
///
/// HTTP/2 clients carry the host in `:authority` rather than a `Host`
/// header; hyper exposes it as the URI authority.
fn direct_request(raw_query: Option<String>, uri: &Uri, mut headers: HeaderMap) -> InboundRequest {
    if !headers.contains_key(header::HOST) {
        if let Some(value) = uri
            .authority()
            .and_then(|authority| HeaderValue::from_str(authority.as_str()).ok())
        {
            headers.insert(header::HOST, value);
        }
    }

    let query = QueryParams::from_pairs(url::form_urlencoded::parse(
        raw_query.unwrap_or_default().as_bytes(),
    ));
    InboundRequest::new(query, headers)
}

/// Request/response-style entry point.
async fn direct_handler(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&headers);
    let request = direct_request(raw_query, &uri, headers);

    tracing::debug!(request_id = %request_id, "Proxying image request");

    let result = state.handle(&request).await;
    let response = DirectAdapter::new(AxumResponseWriter::new()).emit(result);

    metrics::record_request("direct", response.status().as_u16(), start_time);
    response
}

/// Event-style entry point.
async fn event_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(event): Json<ProxyEvent>,
) -> impl IntoResponse {
    let start_time = Instant::now();
    let request_id = request_id(&headers);

    tracing::debug!(request_id = %request_id, "Handling event invocation");

    let request = event.into_inbound();
    let result: EventResponse = EventAdapter.emit(state.handle(&request).await);

    metrics::record_request("event", result.status_code, start_time);
    (StatusCode::OK, Json(result))
}
