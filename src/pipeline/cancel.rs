use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Shared shutdown signal for every stage, guard waiter and in-flight
/// sub-task of one pipeline run.
///
/// Cancelling is sticky: once tripped, [`CancelToken::cancelled`] resolves
/// immediately for every current and future waiter.
#[derive(Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub async fn cancelled(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent `cancel` is not missed.
        notified.as_mut().enable();

        if self.is_cancelled() {
            return;
        }
        notified.await;
    }

    /// Cancel when the returned guard is dropped, unless it was disarmed first.
    pub fn drop_guard(&self) -> CancelOnDrop {
        CancelOnDrop {
            token: Some(self.clone()),
        }
    }
}

/// Trips its [`CancelToken`] on drop. See [`CancelToken::drop_guard`].
pub struct CancelOnDrop {
    token: Option<CancelToken>,
}

impl CancelOnDrop {
    pub fn disarm(mut self) {
        self.token = None;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }
}
