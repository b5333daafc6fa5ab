//! In-memory, deduplicating priority queue of jobs.
//!
//! A job lives in exactly one of two places while the queue knows about it:
//! the pending heap (waiting for a worker) or the in-progress set (handed to a
//! worker, not yet marked done). Both are guarded by one mutex, so the
//! duplicate check and the insertion in [`JobQueue::put`] form a single
//! critical section even under a multi-threaded runtime.

use parking_lot::Mutex;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// Rejection returned when a job is already pending or in progress.
#[derive(Debug, Clone, Error)]
#[error("Job already queued or in progress: {job}")]
pub struct DuplicateJob {
    pub job: String,
}

/// Counts reported by [`JobQueue::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueSnapshot {
    pub pending: usize,
    pub in_progress: usize,
}

struct QueueState<T> {
    heap: BinaryHeap<Reverse<T>>,
    pending: HashSet<T>,
    in_progress: HashSet<T>,
}

impl<T: Ord + Hash> QueueState<T> {
    fn contains(&self, job: &T) -> bool {
        self.pending.contains(job) || self.in_progress.contains(job)
    }
}

/// Priority queue that dispenses the smallest pending job first.
pub struct JobQueue<T> {
    state: Mutex<QueueState<T>>,
    notify: Arc<Notify>,
}

impl<T> JobQueue<T>
where
    T: Ord + Hash + Clone + Display,
{
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                heap: BinaryHeap::new(),
                pending: HashSet::new(),
                in_progress: HashSet::new(),
            }),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Add a job unless an equal job is pending or in progress.
    pub fn put(&self, job: T) -> Result<(), DuplicateJob> {
        {
            let mut state = self.state.lock();
            if state.contains(&job) {
                return Err(DuplicateJob {
                    job: job.to_string(),
                });
            }
            state.pending.insert(job.clone());
            state.heap.push(Reverse(job.clone()));
        }

        info!("Enqueued job {}", job);
        self.notify.notify_one();
        Ok(())
    }

    /// Move the highest-priority pending job to in-progress, if any.
    pub fn try_get(&self) -> Option<T> {
        let mut state = self.state.lock();
        let Reverse(job) = state.heap.pop()?;
        state.pending.remove(&job);
        state.in_progress.insert(job.clone());
        Some(job)
    }

    /// Wait for a pending job and move it to in-progress.
    ///
    /// Cancel-safe: a job is only removed from pending once this returns.
    pub async fn get(&self) -> T {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a put between the check and the
            // await still wakes this waiter.
            notified.as_mut().enable();

            if let Some(job) = self.try_get() {
                debug!("Dequeued job {}", job);
                return job;
            }

            notified.await;
        }
    }

    /// Forget an in-progress job so that it may be queued again.
    ///
    /// Returns `false` (and logs) when the job was not in progress.
    pub fn mark_done(&self, job: &T) -> bool {
        let removed = self.state.lock().in_progress.remove(job);
        if !removed {
            warn!("Job {} marked done but was not in progress", job);
        }
        removed
    }

    /// Number of pending jobs.
    pub fn size(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn in_progress_len(&self) -> usize {
        self.state.lock().in_progress.len()
    }

    /// Whether the job is pending or in progress.
    pub fn contains(&self, job: &T) -> bool {
        self.state.lock().contains(job)
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        let state = self.state.lock();
        QueueSnapshot {
            pending: state.pending.len(),
            in_progress: state.in_progress.len(),
        }
    }
}

impl<T> Default for JobQueue<T>
where
    T: Ord + Hash + Clone + Display,
{
    fn default() -> Self {
        Self::new()
    }
}
