//! Interrupt handling.

use std::future::Future;

use tokio_util::sync::CancellationToken;

/// Cancel `cancel` on the first interrupt and wait for a second one.
///
/// Returns true once the second interrupt arrives, false if listening fails.
pub async fn watch_interrupts<F, Fut>(cancel: CancellationToken, mut next_interrupt: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if next_interrupt().await.is_err() {
        return false;
    }
    tracing::warn!("interrupt received, stopping after the current certification (press Ctrl-C again to quit)");
    cancel.cancel();

    next_interrupt().await.is_ok()
}
