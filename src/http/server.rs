//! Frontend server lifecycle.
//!
//! # Responsibilities
//! - Assemble the Axum router for one `[[server]]` block
//! - Run one accept loop per bound listener, plain or TLS
//! - Drain in-flight requests on shutdown, then force-close after a deadline
//!
//! # Design Decisions
//! - All accept loops of a frontend share one `axum_server::Handle`, so a
//!   single shutdown call reaches every address
//! - The first accept-loop failure closes the sibling loops and is returned
//! - State moves strictly forward: Idle → Serving → ShuttingDown → Stopped

use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::FrontendConfig;
use crate::error::{GatewayError, Result};
use crate::http::dispatch::{dispatch_handler, Dispatch, DispatchMode};
use crate::http::forwarder::http_client;
use crate::net::tls::load_tls_config;
use crate::routing::RuleTable;

/// Lifecycle state of a [`FrontendServer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Idle,
    Serving,
    ShuttingDown,
    Stopped,
}

/// One configured frontend: its router, its TLS material and its accept loops.
pub struct FrontendServer {
    label: String,
    app: Router,
    tls: Option<RustlsConfig>,
    handle: Handle,
    state: watch::Sender<ServerState>,
}

impl FrontendServer {
    /// Build the frontend described by `spec`.
    ///
    /// Compiles the rule table (reading credential files) and loads TLS
    /// material. Sockets are bound separately, see [`crate::net::listener`].
    pub async fn build(spec: &FrontendConfig) -> Result<Self> {
        let label = frontend_label(spec);

        let acme = spec
            .acme_challenge
            .as_ref()
            .map(|acme| ServeDir::new(&acme.root));

        let mode = if spec.redirect_to_https {
            DispatchMode::RedirectToHttps
        } else {
            DispatchMode::Rules(RuleTable::build(spec, &http_client())?)
        };

        let tls = match spec.tls_files() {
            Some((cert, key)) => Some(load_tls_config(cert, key).await?),
            None => None,
        };

        let dispatch = Arc::new(Dispatch::new(acme, mode));
        let app = Router::new()
            .fallback(dispatch_handler)
            .with_state(dispatch)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        tracing::info!(
            server = %label,
            protocol = %spec.protocol,
            tls = tls.is_some(),
            redirect_to_https = spec.redirect_to_https,
            acme = spec.acme_challenge.is_some(),
            "Frontend built"
        );

        let (state, _) = watch::channel(ServerState::Idle);
        Ok(Self {
            label,
            app,
            tls,
            handle: Handle::new(),
            state,
        })
    }

    /// `"<addr>,<addr>:<port>"`, used in logs.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    pub fn tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Number of connections currently open across all listeners.
    pub fn connection_count(&self) -> usize {
        self.handle.connection_count()
    }

    /// Serve on `listeners` until every accept loop ends.
    ///
    /// Returns `Ok(())` after a requested shutdown, or the first accept-loop
    /// error. Can only be called once.
    pub async fn serve(&self, listeners: Vec<TcpListener>) -> Result<()> {
        let mut started = false;
        self.state.send_if_modified(|state| {
            if *state == ServerState::Idle {
                *state = ServerState::Serving;
                started = true;
            }
            started
        });
        if !started {
            return Err(GatewayError::Serve {
                label: self.label.clone(),
                source: io::Error::other("frontend already started"),
            });
        }

        let mut accept_loops = JoinSet::new();
        for listener in listeners {
            let addr = listener.local_addr()?;
            let app = self
                .app
                .clone()
                .into_make_service_with_connect_info::<SocketAddr>();
            let handle = self.handle.clone();

            match &self.tls {
                Some(tls) => {
                    let server = axum_server::from_tcp_rustls(listener, tls.clone()).handle(handle);
                    accept_loops.spawn(async move { (addr, server.serve(app).await) });
                }
                None => {
                    let server = axum_server::from_tcp(listener).handle(handle);
                    accept_loops.spawn(async move { (addr, server.serve(app).await) });
                }
            }
            tracing::info!(server = %self.label, address = %addr, tls = self.tls.is_some(), "Accepting connections");
        }

        let mut outcome = Ok(());
        while let Some(joined) = accept_loops.join_next().await {
            let (addr, result) = match joined {
                Ok(finished) => finished,
                Err(e) => (SocketAddr::from(([0, 0, 0, 0], 0)), Err(io::Error::other(e))),
            };

            if let Err(source) = result {
                tracing::error!(server = %self.label, address = %addr, error = %source, "Accept loop failed");
                if outcome.is_ok() {
                    self.handle.shutdown();
                    outcome = Err(GatewayError::Serve {
                        label: self.label.clone(),
                        source,
                    });
                }
            }
        }

        self.state.send_replace(ServerState::Stopped);
        tracing::info!(server = %self.label, "Frontend stopped");
        outcome
    }

    /// Stop accepting and let in-flight requests finish.
    ///
    /// Connections still open after `deadline` are closed abruptly. Returns
    /// once every connection is gone.
    pub async fn shutdown(&self, deadline: Duration) {
        let mut previous = ServerState::Idle;
        self.state.send_if_modified(|state| {
            previous = *state;
            match previous {
                ServerState::Serving => *state = ServerState::ShuttingDown,
                ServerState::Idle => *state = ServerState::Stopped,
                ServerState::ShuttingDown | ServerState::Stopped => return false,
            }
            true
        });
        if previous != ServerState::Serving {
            return;
        }

        tracing::info!(
            server = %self.label,
            connections = self.connection_count(),
            deadline_secs = deadline.as_secs(),
            "Shutting down frontend"
        );
        self.handle.graceful_shutdown(Some(deadline));

        let drained = tokio::time::timeout(deadline, async {
            while self.connection_count() > 0 {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        })
        .await;

        if drained.is_err() {
            tracing::warn!(
                server = %self.label,
                connections = self.connection_count(),
                "Shutdown deadline exceeded, closing remaining connections"
            );
            self.handle.shutdown();
        }
    }
}

impl std::fmt::Debug for FrontendServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrontendServer")
            .field("label", &self.label)
            .field("tls", &self.tls.is_some())
            .field("state", &self.state())
            .finish()
    }
}

fn frontend_label(spec: &FrontendConfig) -> String {
    let hosts: Vec<String> = spec.hosts.iter().map(|h| h.to_string()).collect();
    format!("{}:{}", hosts.join(","), spec.port)
}
