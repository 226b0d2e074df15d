//! Interrupt handling for the test stage.

use log::warn;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancels `cancel` on the first Ctrl-C.
///
/// Workers stop pulling new candidates once the token is cancelled; candidates
/// already in flight finish and their engines are torn down as usual.
pub fn watch_for_interrupt(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    warn!("Interrupt received, finishing in-flight candidates");
                    cancel.cancel();
                }
            }
            _ = cancel.cancelled() => {}
        }
    })
}

/// Stops the interrupt watcher and waits for it.
pub async fn shutdown_gracefully(cancel: CancellationToken, watcher: JoinHandle<()>) {
    cancel.cancel();
    let _ = watcher.await;
}
