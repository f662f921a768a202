//! Process shutdown.
//!
//! The first Ctrl+C starts a graceful drain. Requests parked on a held lock
//! may never finish, so the drain is bounded by a grace period and cut short
//! by a second Ctrl+C.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

/// Resolves on the first Ctrl+C and flags `draining` so the drain deadline
/// starts counting.
pub async fn shutdown_signal(draining: watch::Sender<bool>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested, draining in-flight requests");
    let _ = draining.send(true);
}

/// Resolves once a drain has started and then either `grace` elapses or
/// `force` resolves. Pending forever if no drain ever starts.
pub async fn drain_deadline<F>(mut draining: watch::Receiver<bool>, grace: Duration, force: F)
where
    F: Future<Output = ()>,
{
    if draining.wait_for(|started| *started).await.is_err() {
        std::future::pending::<()>().await;
    }

    tokio::select! {
        _ = tokio::time::sleep(grace) => {
            tracing::warn!("Drain did not finish within {:?}, abandoning parked requests", grace);
        }
        _ = force => {
            tracing::warn!("Second Ctrl+C received, abandoning parked requests");
        }
    }
}

/// Second Ctrl+C, used as the `force` input of [`drain_deadline`].
pub async fn second_ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
