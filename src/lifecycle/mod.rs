//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Init logging/metrics → Build pipeline → Listen
//!
//! Shutdown:
//!     signals.rs (SIGTERM/SIGINT) → shutdown.rs (broadcast) → server drains → exit
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::spawn_signal_handler;
