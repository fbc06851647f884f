//! Counting barrier for a job's subpage tasks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    pending: AtomicUsize,
    notify: Notify,
}

/// Waits until every armed guard has been dropped.
///
/// Each subpage task holds one [`PendingGuard`]. The guard decrements the pending
/// count when it drops, so a task that errors or panics still releases the barrier.
#[derive(Debug, Clone, Default)]
pub struct CompletionBarrier {
    inner: Arc<Inner>,
}

/// Marks one outstanding task. Dropping it completes the task.
#[derive(Debug)]
pub struct PendingGuard {
    inner: Arc<Inner>,
}

/// Guards not yet handed to a task.
#[derive(Debug)]
pub struct PendingGuards {
    inner: Arc<Inner>,
    remaining: usize,
}

impl Inner {
    fn release(&self, n: usize) {
        if n > 0 && self.pending.fetch_sub(n, Ordering::AcqRel) == n {
            self.notify.notify_waiters();
        }
    }
}

impl CompletionBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `n` outstanding tasks. Guards are handed out lazily by the returned
    /// iterator; any it never yields are released when it drops.
    pub fn arm(&self, n: usize) -> PendingGuards {
        self.inner.pending.fetch_add(n, Ordering::AcqRel);
        PendingGuards {
            inner: Arc::clone(&self.inner),
            remaining: n,
        }
    }

    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Resolve once the pending count is zero.
    pub async fn wait(&self) {
        loop {
            // Register before checking so a release between the check and the
            // await is not lost.
            let notified = self.inner.notify.notified();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.inner.release(1);
    }
}

impl Iterator for PendingGuards {
    type Item = PendingGuard;

    fn next(&mut self) -> Option<PendingGuard> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(PendingGuard {
            inner: Arc::clone(&self.inner),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for PendingGuards {}

impl Drop for PendingGuards {
    fn drop(&mut self) {
        self.inner.release(self.remaining);
    }
}
