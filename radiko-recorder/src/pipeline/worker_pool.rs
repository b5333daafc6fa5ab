//! Worker pool draining a [`JobQueue`].

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::Display;
use std::hash::Hash;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::job_queue::JobQueue;
use crate::{Error, Result};

/// Work performed for each dequeued job.
#[async_trait]
pub trait JobProcessor<T>: Send + Sync {
    async fn process(&self, job: &T) -> Result<()>;
}

/// Configuration for a worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerPoolConfig {
    /// Number of concurrent workers.
    pub num_workers: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self { num_workers: 3 }
    }
}

/// A fixed set of workers sharing one queue and one processor.
///
/// Each worker takes a job, runs the processor, and always marks the job done
/// afterwards. Processor errors and panics are logged and never stop a worker.
pub struct WorkerPool<T> {
    config: WorkerPoolConfig,
    queue: Arc<JobQueue<T>>,
    processor: Arc<dyn JobProcessor<T>>,
    /// Jobs currently being processed.
    busy_workers: Arc<AtomicUsize>,
    cancellation_token: CancellationToken,
    tasks: parking_lot::Mutex<Option<JoinSet<()>>>,
}

impl<T> WorkerPool<T>
where
    T: Ord + Hash + Clone + Display + Send + Sync + 'static,
{
    pub fn new(
        config: WorkerPoolConfig,
        queue: Arc<JobQueue<T>>,
        processor: Arc<dyn JobProcessor<T>>,
    ) -> Result<Self> {
        if config.num_workers == 0 {
            return Err(Error::config("Worker pool needs at least one worker"));
        }

        Ok(Self {
            config,
            queue,
            processor,
            busy_workers: Arc::new(AtomicUsize::new(0)),
            cancellation_token: CancellationToken::new(),
            tasks: parking_lot::Mutex::new(Some(JoinSet::new())),
        })
    }

    /// Spawn the workers.
    pub fn start(&self) {
        let mut tasks = self.tasks.lock();
        let Some(join_set) = tasks.as_mut() else {
            warn!("Worker pool already stopped; not starting workers");
            return;
        };
        if !join_set.is_empty() {
            warn!("Worker pool already started");
            return;
        }

        info!(
            "Starting worker pool with {} workers",
            self.config.num_workers
        );

        for worker_id in 0..self.config.num_workers {
            join_set.spawn(run_worker(
                worker_id,
                self.queue.clone(),
                self.processor.clone(),
                self.busy_workers.clone(),
                self.cancellation_token.clone(),
            ));
        }
    }

    /// Cancel all workers and wait for them to exit.
    pub async fn stop(&self) {
        info!("Stopping worker pool");
        self.cancellation_token.cancel();

        // Take the join set out of the mutex before awaiting
        let join_set = {
            let mut tasks = self.tasks.lock();
            tasks.take()
        };

        if let Some(mut join_set) = join_set {
            while let Some(result) = join_set.join_next().await {
                if let Err(e) = result {
                    error!("Worker task ended abnormally: {}", e);
                }
            }
        }

        info!("Worker pool stopped");
    }

    /// Number of workers currently processing a job.
    pub fn busy_count(&self) -> usize {
        self.busy_workers.load(Ordering::SeqCst)
    }
}

async fn run_worker<T>(
    worker_id: usize,
    queue: Arc<JobQueue<T>>,
    processor: Arc<dyn JobProcessor<T>>,
    busy_workers: Arc<AtomicUsize>,
    cancellation_token: CancellationToken,
) where
    T: Ord + Hash + Clone + Display + Send + Sync + 'static,
{
    debug!("Worker {} started", worker_id);

    loop {
        let job = tokio::select! {
            biased;
            _ = cancellation_token.cancelled() => break,
            job = queue.get() => job,
        };

        busy_workers.fetch_add(1, Ordering::SeqCst);
        info!("Worker {} processing job {}", worker_id, job);

        let outcome = tokio::select! {
            biased;
            _ = cancellation_token.cancelled() => None,
            result = AssertUnwindSafe(processor.process(&job)).catch_unwind() => Some(result),
        };

        match outcome {
            None => warn!("Worker {} cancelled while processing job {}", worker_id, job),
            Some(Ok(Ok(()))) => info!("Worker {} finished job {}", worker_id, job),
            Some(Ok(Err(e))) => error!("Worker {} failed job {}: {}", worker_id, job, e),
            Some(Err(panic)) => error!(
                "Worker {} panicked while processing job {}: {}",
                worker_id,
                job,
                panic_message(panic.as_ref())
            ),
        }

        queue.mark_done(&job);
        busy_workers.fetch_sub(1, Ordering::SeqCst);

        if cancellation_token.is_cancelled() {
            break;
        }
    }

    debug!("Worker {} shutting down", worker_id);
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
