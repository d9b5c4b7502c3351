//! Operator abort signal

use tokio::sync::watch;

/// Resolves once the signal reads `true`
///
/// Pends forever when there is no signal or its sender is gone.
pub(crate) async fn requested(abort: Option<&watch::Receiver<bool>>) {
    let Some(abort) = abort else {
        return std::future::pending().await;
    };
    let mut abort = abort.clone();
    if abort.wait_for(|requested| *requested).await.is_err() {
        std::future::pending::<()>().await;
    }
}
