//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! GET /  (query + headers)            POST /invoke (JSON event)
//!     → InboundRequest                     → event.rs (ProxyEvent → InboundRequest)
//!     → Pipeline::handle                   → Pipeline::handle
//!     → response.rs (DirectAdapter)        → event.rs (EventAdapter)
//!     → raw bytes                          → JSON EventResponse
//! ```

pub mod adapter;
pub mod event;
pub mod response;
pub mod server;

pub use adapter::HostAdapter;
pub use event::{handle_event, EventAdapter, EventResponse, ProxyEvent};
pub use response::{AxumResponseWriter, DirectAdapter, ResponseWriter};
pub use server::HttpServer;
