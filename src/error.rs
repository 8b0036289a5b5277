//! Error types for the gateway.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::loader::ConfigError;

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors raised while provisioning or running frontends.
///
/// Per-request failures never show up here: they are turned into HTTP
/// responses by the dispatch handler.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration could not be loaded or failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A listener could not be opened.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Certificate or key could not be loaded.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Credential file unreadable or malformed.
    #[error("credential file {path}: {reason}")]
    Credential { path: String, reason: String },

    /// Realm cannot be carried in a `WWW-Authenticate` header.
    #[error("invalid realm {0:?}")]
    InvalidRealm(String),

    /// Backend target URL could not be formed.
    #[error("invalid backend target {0}")]
    InvalidTarget(String),

    /// A listener terminated outside of the shutdown path.
    #[error("server ({label}) stopped unexpectedly: {source}")]
    Serve {
        label: String,
        #[source]
        source: std::io::Error,
    },
}
