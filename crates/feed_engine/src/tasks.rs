//! Detached background work.
//!
//! Fire-and-forget publishes are spawned here instead of being awaited by the
//! stream that produced them. The set is owned by the service and drained on
//! shutdown.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// A shared set of detached tasks.
#[derive(Debug, Clone, Default)]
pub struct BackgroundTasks {
    inner: Arc<Mutex<JoinSet<()>>>,
}

impl BackgroundTasks {
    /// Create an empty task set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` in the background. Must be called within a Tokio runtime.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut set = self.inner.lock();
        // Reap finished tasks so the set does not grow with the stream.
        while set.try_join_next().is_some() {}
        set.spawn(task);
    }

    /// Run `task` in the background, abandoning it after `timeout`.
    ///
    /// A stalled task therefore holds its slot in the set for at most
    /// `timeout`.
    pub fn spawn_with_timeout<F>(&self, timeout: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.spawn(async move {
            if tokio::time::timeout(timeout, task).await.is_err() {
                let timeout_ms = timeout.as_millis() as u64;
                warn!(timeout_ms, "background task timed out, abandoned");
            }
        });
    }

    /// Number of tasks not yet reaped.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns `true` if no task is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Wait up to `timeout` for pending tasks, then abort the rest.
    ///
    /// Returns how many tasks were abandoned.
    pub async fn drain(&self, timeout: Duration) -> usize {
        let mut set = std::mem::take(&mut *self.inner.lock());
        if set.is_empty() {
            return 0;
        }
        debug!(pending = set.len(), "draining background tasks");

        let finished = tokio::time::timeout(timeout, async {
            while set.join_next().await.is_some() {}
        })
        .await;

        if finished.is_err() {
            let abandoned = set.len();
            warn!(abandoned, "background tasks still running at shutdown, aborting");
            set.abort_all();
            abandoned
        } else {
            0
        }
    }
}
