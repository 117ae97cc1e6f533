//! Cancelable delayed tasks for AI "thinking" pauses.
//!
//! A scheduled turn sleeps on the tokio timer, then runs its body. Cancelling
//! during the sleep wakes the task and the body is never polled, so a
//! cancelled turn can't leave a half-applied move behind.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Handle that cancels a scheduled turn. Cheap to clone.
#[derive(Debug, Clone)]
pub struct TurnCanceller {
    tx: Arc<watch::Sender<bool>>,
}

impl TurnCanceller {
    pub fn cancel(&self) {
        // Nobody listening means the task already finished
        let _ = self.tx.send(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// A task waiting out its delay, or already running
#[derive(Debug)]
pub struct ScheduledTurn<T> {
    canceller: TurnCanceller,
    handle: JoinHandle<Option<T>>,
}

impl<T> ScheduledTurn<T> {
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    pub fn canceller(&self) -> TurnCanceller {
        self.canceller.clone()
    }

    /// Wait for the task. `None` if it was cancelled before its body ran.
    pub async fn join(self) -> Option<T> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => {
                warn!("scheduled turn failed: {}", e);
                None
            }
        }
    }
}

/// Run `task` after `delay` unless cancelled first. A zero delay starts the
/// body right away.
pub fn schedule<F, T>(delay: Duration, task: F) -> ScheduledTurn<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let (tx, mut rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        if !delay.is_zero() {
            tokio::select! {
                biased;
                _ = cancelled(&mut rx) => {}
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let was_cancelled = *rx.borrow();
        if was_cancelled {
            debug!(?delay, "scheduled turn cancelled");
            return None;
        }
        Some(task.await)
    });

    ScheduledTurn {
        canceller: TurnCanceller { tx: Arc::new(tx) },
        handle,
    }
}

/// Resolves once the flag is set. Never resolves if the sender goes away.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        let set = *rx.borrow_and_update();
        if set {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
