//! HTTP/HTTPS gateway library.
//!
//! Terminates TLS, routes requests by host and path prefix to plain HTTP
//! backends, serves ACME HTTP-01 challenges and redirects HTTP to HTTPS.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::{load_config, GatewayConfig};
pub use error::{GatewayError, Result};
pub use http::FrontendServer;
pub use lifecycle::{Gateway, Shutdown, SHUTDOWN_TIMEOUT};
