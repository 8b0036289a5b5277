//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::net::IpAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration: one entry per frontend.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct GatewayConfig {
    /// Frontend definitions, one `[[server]]` table each.
    #[serde(default, rename = "server")]
    pub servers: Vec<FrontendConfig>,
}

/// Listening protocol of a frontend.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Http => f.write_str("http"),
            Protocol::Https => f.write_str("https"),
        }
    }
}

/// A single listening endpoint and its dispatch behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FrontendConfig {
    /// `http` or `https`.
    pub protocol: Protocol,

    /// Addresses to bind, all at the same port.
    pub hosts: Vec<IpAddr>,

    /// Listening port.
    pub port: u16,

    /// Answer every non-ACME request with a permanent redirect to HTTPS.
    #[serde(default)]
    pub redirect_to_https: bool,

    /// Serve ACME HTTP-01 challenge files from this root.
    #[serde(default)]
    pub acme_challenge: Option<AcmeChallengeConfig>,

    /// Path to certificate chain (PEM).
    #[serde(default)]
    pub tls_cert_file: Option<PathBuf>,

    /// Path to private key (PEM).
    #[serde(default)]
    pub tls_key_file: Option<PathBuf>,

    /// Proxy routes, evaluated in order.
    #[serde(default, rename = "proxy")]
    pub proxies: Vec<RouteConfig>,

    /// Upgrade rewritten backend redirects to `https`.
    ///
    /// Derived by the loader: set on every frontend when any frontend
    /// redirects plain HTTP to HTTPS.
    #[serde(skip)]
    pub force_https: bool,
}

impl FrontendConfig {
    /// A frontend with no routes, ACME root, TLS files or redirects.
    pub fn new(protocol: Protocol, hosts: Vec<IpAddr>, port: u16) -> Self {
        Self {
            protocol,
            hosts,
            port,
            redirect_to_https: false,
            acme_challenge: None,
            tls_cert_file: None,
            tls_key_file: None,
            proxies: Vec::new(),
            force_https: false,
        }
    }

    /// Both certificate and key are configured.
    pub fn tls_files(&self) -> Option<(&PathBuf, &PathBuf)> {
        match (&self.tls_cert_file, &self.tls_key_file) {
            (Some(cert), Some(key)) => Some((cert, key)),
            _ => None,
        }
    }
}

/// ACME HTTP-01 challenge directory.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcmeChallengeConfig {
    /// Webroot; files are looked up under `<root>/.well-known/acme-challenge/`.
    pub root: PathBuf,
}

/// Route configuration mapping requests to a backend target.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging.
    pub name: String,

    /// Request matcher.
    #[serde(default)]
    pub from: RouteFrom,

    /// Backend target.
    pub to: RouteTarget,

    /// Optional Basic Authentication requirement.
    #[serde(default)]
    pub basic_auth: Option<BasicAuthConfig>,
}

/// Host and path constraints of a route. Empty means unconstrained.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RouteFrom {
    /// Exact host to match (port excluded).
    #[serde(default)]
    pub host: Option<String>,

    /// Path prefix; starts and ends with `/`.
    #[serde(default)]
    pub path: Option<String>,
}

/// Backend host and port.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteTarget {
    pub host: String,
    pub port: u16,
}

/// Basic Authentication requirement for a route.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BasicAuthConfig {
    /// Realm announced in the `WWW-Authenticate` challenge.
    pub realm: String,

    /// File holding a single `username:hash` line.
    pub credential_file: PathBuf,
}
