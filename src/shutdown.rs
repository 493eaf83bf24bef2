//! Shutdown coordination: signal wait, connection drain, bounded exit.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::domain::ConnectionRegistry;

/// Resolves once a termination signal has arrived and the relay has been
/// drained; handed to `axum::serve(...).with_graceful_shutdown`.
///
/// Drain order: stop the liveness timer, best-effort shutdown notice plus
/// terminate for every connection, then let the listener close. A spawned
/// watchdog force-exits the process after `grace` so a hung peer cannot
/// hold the process open indefinitely.
pub async fn graceful(
    registry: Arc<ConnectionRegistry>,
    liveness: JoinHandle<()>,
    grace: Duration,
) {
    wait_for_signal().await;
    tracing::info!("shutdown signal received, draining connections");

    liveness.abort();
    registry.shutdown_all().await;

    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        tracing::warn!("grace period elapsed, forcing exit");
        std::process::exit(0);
    });
}

/// Completes on SIGINT, or SIGTERM where available.
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(%err, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
