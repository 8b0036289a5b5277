//! Listener provisioning.
//!
//! # Responsibilities
//! - Bind one TCP listener per configured address, all at the frontend's port
//! - Hand non-blocking std listeners to the HTTP layer
//! - Never leave a frontend with a partial set of open sockets
//!
//! # Design Decisions
//! - Binding is synchronous and happens before any server starts
//! - On the first failure every listener opened so far is closed

use std::net::{SocketAddr, TcpListener};

use crate::config::FrontendConfig;
use crate::error::{GatewayError, Result};

/// Open a listener on every address of `frontend`.
pub fn bind(frontend: &FrontendConfig) -> Result<Vec<TcpListener>> {
    let mut listeners = Vec::with_capacity(frontend.hosts.len());

    for host in &frontend.hosts {
        let addr = SocketAddr::new(*host, frontend.port);
        match open(addr) {
            Ok(listener) => {
                tracing::info!(address = %listener.local_addr()?, "Listener bound");
                listeners.push(listener);
            }
            Err(source) => {
                tracing::error!(address = %addr, error = %source, "Failed to bind listener");
                // Dropping closes the sockets.
                drop(listeners);
                return Err(GatewayError::Bind { addr, source });
            }
        }
    }

    Ok(listeners)
}

fn open(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(addr)?;
    listener.set_nonblocking(true)?;
    Ok(listener)
}
