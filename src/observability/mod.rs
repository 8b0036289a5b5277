//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (server, address, rule, ...)
//!     → tower-http TraceLayer spans per request, tagged with x-request-id
//!
//! Consumers:
//!     → logging.rs (fmt subscriber on stderr, filtered by RUST_LOG)
//! ```

pub mod logging;

pub use logging::init_logging;
