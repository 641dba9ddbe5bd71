//! HTTP server lifecycle
//!
//! Binds the auth router and serves it on a background task until
//! [`AuthServer::shutdown`] is called or the handle is dropped.

use std::net::SocketAddr;

use axum::Router;
use moodmix_domain::{MoodmixError, Result};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Running HTTP server; dropping it stops serving
pub struct AuthServer {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl AuthServer {
    /// Bind `bind_address` (`127.0.0.1:0` picks a free port) and start serving.
    ///
    /// # Errors
    /// Returns [`MoodmixError::Network`] when the address cannot be bound.
    pub async fn start(bind_address: &str, router: Router) -> Result<Self> {
        let listener = TcpListener::bind(bind_address).await.map_err(|err| {
            MoodmixError::Network(format!("failed to bind {bind_address}: {err}"))
        })?;

        let local_addr = listener
            .local_addr()
            .map_err(|err| MoodmixError::Network(format!("failed to determine port: {err}")))?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!(error = %err, "http server error");
            }
        });

        info!(%local_addr, "http server listening");
        Ok(Self { local_addr, shutdown_tx: Some(shutdown_tx), handle: Some(handle) })
    }

    /// Address actually bound (resolves port 0)
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                error!(error = %err, "http server task failed");
            }
        }
        info!(local_addr = %self.local_addr, "http server stopped");
    }
}

impl Drop for AuthServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                handle.abort();
            }
        }
    }
}
