//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline events (via the injected PipelineObserver):
//!     → observer.rs (TracingObserver: structured events + metrics)
//!     → logging.rs  (tracing subscriber: text or JSON)
//!     → metrics.rs  (counters, histograms, Prometheus exporter)
//! ```
//!
//! # Design Decisions
//! - The pipeline never logs directly; it reports to an observer so tests
//!   can assert on events without capturing output
//! - Request ID flows through the tower-http request-id layers

pub mod logging;
pub mod metrics;
pub mod observer;

pub use observer::{PipelineObserver, TracingObserver};
