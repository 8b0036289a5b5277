//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! FrontendConfig
//!     → listener.rs (one socket per bind address, all-or-nothing)
//!     → tls.rs (certificate/key pair, loaded once for https frontends)
//!     → Hand off to the HTTP layer (accept loops live in axum-server)
//! ```
//!
//! # Design Decisions
//! - Sockets are opened before servers are built, so bind errors stop startup early
//! - TLS material is read once; a load failure is fatal to the frontend

pub mod listener;
pub mod tls;
