//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection (axum-server accept loop)
//!     → server.rs (request id, tracing, connect info)
//!     → dispatch.rs (ACME files → HTTPS redirect → rule table)
//!     → [routing layer picks the first matching rule]
//!     → forwarder.rs (X-Forwarded-*, upstream call, Location rewrite)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod forwarder;
pub mod server;

pub use forwarder::{http_client, Forwarder, HttpClient};
pub use server::{FrontendServer, ServerState};
