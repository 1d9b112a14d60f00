//! Signal handling for graceful shutdown.

use std::future::Future;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::watch;
use tracing::{info, warn};

/// Creates a future that completes when a shutdown signal is received.
///
/// Listens for SIGTERM and SIGINT (Ctrl+C). A handler that cannot be
/// installed is logged and never fires.
pub async fn shutdown_signal() {
    tokio::select! {
        _ = wait_for(SignalKind::terminate(), "SIGTERM") => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
        _ = wait_for(SignalKind::interrupt(), "SIGINT") => {
            info!("Received SIGINT, initiating graceful shutdown");
        }
    }
}

fn wait_for(kind: SignalKind, name: &'static str) -> impl Future<Output = ()> {
    async move {
        match signal(kind) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(signal = name, error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Spawns a task that flips the returned receiver to `true` on shutdown.
pub fn spawn_shutdown_watch() -> watch::Receiver<bool> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });
    shutdown_rx
}
