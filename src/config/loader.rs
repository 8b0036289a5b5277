//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Why a configuration file could not be turned into a [`GatewayConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Io(#[source] std::io::Error),

    #[error("malformed configuration: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("invalid configuration: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Load and validate configuration from a TOML file.
///
/// Relative file paths are resolved against the directory holding the
/// configuration file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    parse_config(&content, base)
}

/// Parse and validate configuration text, resolving paths against `base`.
pub fn parse_config(content: &str, base: &Path) -> Result<GatewayConfig, ConfigError> {
    let mut config: GatewayConfig = toml::from_str(content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    let force_https = config.servers.iter().any(|s| s.redirect_to_https);
    for server in &mut config.servers {
        server.force_https = force_https;
        if let Some(acme) = server.acme_challenge.as_mut() {
            acme.root = resolve(base, &acme.root);
        }
        if let Some(cert) = server.tls_cert_file.as_mut() {
            *cert = resolve(base, cert);
        }
        if let Some(key) = server.tls_key_file.as_mut() {
            *key = resolve(base, key);
        }
        for route in &mut server.proxies {
            if let Some(auth) = route.basic_auth.as_mut() {
                auth.credential_file = resolve(base, &auth.credential_file);
            }
        }
    }

    Ok(config)
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
