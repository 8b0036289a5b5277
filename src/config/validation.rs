//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic: protocol names, IP addresses, ports)
//! - Check that each frontend has a single, coherent dispatch mode
//! - Check TLS material is present exactly on `https` frontends
//! - Check route matchers and backend targets
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::{FrontendConfig, GatewayConfig, Protocol, RouteConfig};
use crate::routing::router::backend_url;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no server blocks found")]
    NoServers,

    #[error("server #{server}: at least one host is required")]
    NoHosts { server: usize },

    #[error("server #{server}: acme_challenge must be on an http listener")]
    AcmeOnHttps { server: usize },

    #[error("server #{server}: redirect_to_https must be on an http listener")]
    RedirectOnHttps { server: usize },

    #[error("server #{server}: redirect_to_https cannot be used with proxy")]
    RedirectWithProxy { server: usize },

    #[error("redirect_to_https requires an https listener")]
    RedirectWithoutHttps,

    #[error("server #{server}: {field} is required for an https listener")]
    MissingTlsFile { server: usize, field: &'static str },

    #[error("server #{server}: {field} is only allowed for an https listener")]
    UnexpectedTlsFile { server: usize, field: &'static str },

    #[error("server #{server}, proxy {name}: path must start and end with '/'")]
    InvalidPath { server: usize, name: String },

    #[error("server #{server}, proxy {name}: either host or path must be specified")]
    EmptyMatcher { server: usize, name: String },

    #[error("server #{server}, proxy {name}: invalid host or port {target}")]
    InvalidTarget {
        server: usize,
        name: String,
        target: String,
    },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.servers.is_empty() {
        errors.push(ValidationError::NoServers);
    }

    for (index, server) in config.servers.iter().enumerate() {
        validate_frontend(index, server, &mut errors);
    }

    let redirects = config.servers.iter().any(|s| s.redirect_to_https);
    let listens_https = config.servers.iter().any(|s| s.protocol == Protocol::Https);
    if redirects && !listens_https {
        errors.push(ValidationError::RedirectWithoutHttps);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_frontend(server: usize, cfg: &FrontendConfig, errors: &mut Vec<ValidationError>) {
    if cfg.hosts.is_empty() {
        errors.push(ValidationError::NoHosts { server });
    }

    if cfg.acme_challenge.is_some() && cfg.protocol != Protocol::Http {
        errors.push(ValidationError::AcmeOnHttps { server });
    }

    if cfg.redirect_to_https {
        if cfg.protocol != Protocol::Http {
            errors.push(ValidationError::RedirectOnHttps { server });
        }
        if !cfg.proxies.is_empty() {
            errors.push(ValidationError::RedirectWithProxy { server });
        }
    }

    let tls_fields = [
        ("tls_cert_file", cfg.tls_cert_file.is_some()),
        ("tls_key_file", cfg.tls_key_file.is_some()),
    ];
    for (field, present) in tls_fields {
        match (cfg.protocol, present) {
            (Protocol::Https, false) => {
                errors.push(ValidationError::MissingTlsFile { server, field })
            }
            (Protocol::Http, true) => {
                errors.push(ValidationError::UnexpectedTlsFile { server, field })
            }
            _ => {}
        }
    }

    for route in &cfg.proxies {
        validate_route(server, route, errors);
    }
}

fn validate_route(server: usize, route: &RouteConfig, errors: &mut Vec<ValidationError>) {
    let host = route.from.host.as_deref().unwrap_or_default();
    let path = route.from.path.as_deref().unwrap_or_default();

    if !path.is_empty() && !(path.starts_with('/') && path.ends_with('/')) {
        errors.push(ValidationError::InvalidPath {
            server,
            name: route.name.clone(),
        });
    }

    if host.is_empty() && path.is_empty() {
        errors.push(ValidationError::EmptyMatcher {
            server,
            name: route.name.clone(),
        });
    }

    if route.to.port == 0 || backend_url(&route.to).is_err() {
        errors.push(ValidationError::InvalidTarget {
            server,
            name: route.name.clone(),
            target: format!("{}:{}", route.to.host, route.to.port),
        });
    }
}
