//! Shutdown coordination for the gateway.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::http::FrontendServer;

/// Time in-flight requests get to finish before connections are closed.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Latching stop request shared by the orchestrator and whoever may stop it
/// (signal listener, tests).
///
/// Once triggered it stays triggered, so a waiter that subscribes late still
/// sees it.
#[derive(Debug, Clone)]
pub struct Shutdown {
    requested: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (requested, _) = watch::channel(false);
        Self {
            requested: Arc::new(requested),
        }
    }

    /// Request shutdown. Later calls are no-ops.
    pub fn trigger(&self) {
        if !self.requested.send_replace(true) {
            tracing::info!("Shutdown triggered");
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.requested.borrow()
    }

    /// Resolves once [`trigger`](Self::trigger) has been called.
    pub fn triggered(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut requested = self.requested.subscribe();
        async move {
            let _ = requested.wait_for(|requested| *requested).await;
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Shut every frontend down concurrently, each with `deadline`.
pub async fn drain_all(frontends: &[Arc<FrontendServer>], deadline: Duration) {
    let started = std::time::Instant::now();
    futures_util::future::join_all(frontends.iter().map(|f| f.shutdown(deadline))).await;
    tracing::info!(
        frontends = frontends.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "All frontends drained"
    );
}
