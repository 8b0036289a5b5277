//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the listeners of every frontend before anything serves
//! - Build every frontend (rule tables, credentials, TLS material)
//! - Run all frontends until shutdown is requested or one of them fails
//!
//! # Design Decisions
//! - Fail fast: any bind or build error aborts startup with nothing serving
//! - Listeners start last (traffic only when every frontend is ready)
//! - A fatal error in one frontend stops all of them

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::http::FrontendServer;
use crate::lifecycle::shutdown::{drain_all, Shutdown};
use crate::net::listener;

/// A running set of frontends.
#[derive(Debug)]
pub struct Gateway {
    frontends: Vec<Arc<FrontendServer>>,
    tasks: JoinSet<Result<()>>,
    shutdown: Shutdown,
}

impl Gateway {
    /// Bind, build and start every frontend of `config`.
    pub async fn start(config: &GatewayConfig) -> Result<Self> {
        let mut bound: Vec<Vec<TcpListener>> = Vec::with_capacity(config.servers.len());
        for spec in &config.servers {
            bound.push(listener::bind(spec)?);
        }

        let mut frontends = Vec::with_capacity(config.servers.len());
        for spec in &config.servers {
            frontends.push(Arc::new(FrontendServer::build(spec).await?));
        }

        let shutdown = Shutdown::new();

        let mut tasks = JoinSet::new();
        for (frontend, listeners) in frontends.iter().zip(bound) {
            let frontend = frontend.clone();
            tasks.spawn(async move { frontend.serve(listeners).await });
        }

        tracing::info!(frontends = frontends.len(), "Gateway started");
        Ok(Self {
            frontends,
            tasks,
            shutdown,
        })
    }

    pub fn frontends(&self) -> &[Arc<FrontendServer>] {
        &self.frontends
    }

    /// Handle that stops the gateway when triggered.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Serve until shutdown is triggered or a frontend fails, then drain.
    ///
    /// Returns the first frontend error, if any.
    pub async fn wait(mut self, deadline: Duration) -> Result<()> {
        let outcome = tokio::select! {
            _ = self.shutdown.triggered() => {
                tracing::info!("Shutdown requested");
                Ok(())
            }
            Some(joined) = self.tasks.join_next() => match joined {
                Ok(Ok(())) => {
                    tracing::warn!("Frontend stopped unexpectedly");
                    Ok(())
                }
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Frontend failed, stopping gateway");
                    Err(e)
                }
                Err(e) => Err(GatewayError::Io(std::io::Error::other(e))),
            },
        };

        drain_all(&self.frontends, deadline).await;

        while let Some(joined) = self.tasks.join_next().await {
            if let Ok(Err(e)) = joined {
                tracing::warn!(error = %e, "Frontend reported error during shutdown");
            }
        }

        tracing::info!("Gateway stopped");
        outcome
    }
}

/// Start `config` and run until `stop` resolves or a frontend fails.
pub async fn run<F>(config: &GatewayConfig, stop: F, deadline: Duration) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let gateway = Gateway::start(config).await?;
    let shutdown = gateway.shutdown_handle();
    tokio::spawn(async move {
        stop.await;
        shutdown.trigger();
    });
    gateway.wait(deadline).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FrontendConfig, Protocol};

    fn frontend(addr: &str, port: u16) -> FrontendConfig {
        FrontendConfig::new(Protocol::Http, vec![addr.parse().unwrap()], port)
    }

    #[tokio::test]
    async fn test_bind_failure_aborts_startup() {
        let blocker = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = blocker.local_addr().unwrap().port();
        let free = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();

        let config = GatewayConfig {
            servers: vec![frontend("127.0.0.1", free), frontend("127.0.0.1", port)],
        };
        let err = Gateway::start(&config).await.unwrap_err();
        assert!(matches!(err, GatewayError::Bind { .. }));

        // Nothing keeps serving on the first port.
        assert!(TcpListener::bind(("127.0.0.1", free)).is_ok());
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let config = GatewayConfig {
            servers: vec![frontend("127.0.0.1", 0), frontend("127.0.0.2", 0)],
        };
        let gateway = Gateway::start(&config).await.unwrap();
        assert_eq!(gateway.frontends().len(), 2);

        let frontends = gateway.frontends().to_vec();
        gateway.shutdown_handle().trigger();
        gateway.wait(Duration::from_secs(1)).await.unwrap();

        for frontend in frontends {
            assert_eq!(frontend.state(), crate::http::ServerState::Stopped);
        }
    }
}
