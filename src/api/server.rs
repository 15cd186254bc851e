//! Records API server lifecycle.
//!
//! Binds the listener, mounts `records_api_router()`, and runs the
//! server in a background task behind a oneshot shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::api::router::records_api_router;
use crate::service::RecordService;

/// Handle to a running records API server.
pub struct RecordsServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl RecordsServer {
    /// Shut down the server gracefully.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("records API server shutdown signal sent");
        }
    }
}

/// Start the records API server on `bind_addr`.
///
/// Binds first so a bad address fails here, then spawns the axum
/// server in a background tokio task and returns the handle.
pub async fn start_records_server(
    service: Arc<RecordService>,
    bind_addr: &str,
) -> Result<RecordsServer, String> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|e| format!("Failed to bind records API server: {e}"))?;

    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    tracing::info!(%addr, "records API server binding");

    let app = records_api_router(service);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("records API server received shutdown signal");
        };

        tracing::info!(%addr, "records API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("records API server error: {e}");
        }

        tracing::info!("records API server stopped");
    });

    Ok(RecordsServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
    })
}
