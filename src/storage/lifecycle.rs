//! Background task lifecycle
//!
//! Every background task observes the same cancellation token and is tracked
//! so that shutdown can wait for all of them, whichever finishes last.

use std::future::Future;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;

/// Coordinates the background tasks of a storage
pub(crate) struct Lifecycle {
    /// Shared cancellation signal, owned by the caller
    cancel: CancellationToken,

    /// Counts the tasks still running
    tracker: TaskTracker,
}

impl Lifecycle {
    pub fn new(cancel: CancellationToken) -> Self {
        Lifecycle {
            cancel,
            tracker: TaskTracker::new(),
        }
    }

    /// The token background tasks must observe
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Spawn a tracked task on the current tokio runtime
    pub fn spawn<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(async move {
            task.await;
            debug!("{} stopped", name);
        });
    }

    /// Number of tasks that have not returned yet
    pub fn running(&self) -> usize {
        self.tracker.len()
    }

    /// Wait until every spawned task has returned
    ///
    /// This does not cancel anything: it resolves once the tasks have
    /// observed the token and finished their work, and never otherwise.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}
