//! Graceful shutdown handler.

use tokio::sync::watch;

/// First Ctrl+C asks the crawl to stop after the current job. Second Ctrl+C exits immediately.
///
/// Returns the receiver the controller polls between visits.
pub fn setup_shutdown_handler() -> watch::Receiver<bool> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!(
                "Received Ctrl+C, finishing the current job. Press Ctrl+C again to force quit"
            );
            let _ = shutdown_tx.send(true);

            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::error!("Force quit requested, exiting immediately");
                std::process::exit(1);
            }
        }
    });

    shutdown_rx
}
