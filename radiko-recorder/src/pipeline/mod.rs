//! Recording pipeline.
//!
//! This module provides:
//! - A deduplicating priority queue of jobs (`JobQueue`)
//! - A fixed-size worker pool draining it (`WorkerPool`)
//! - Validated submission in front of the queue (`Ingress`)
//! - The processor that records a job and reports the result (`RecordingProcessor`)

pub mod ingress;
pub mod job_queue;
pub mod processor;
pub mod worker_pool;

pub use ingress::{Ingress, SubmitOutcome};
pub use job_queue::{DuplicateJob, JobQueue, QueueSnapshot};
pub use processor::RecordingProcessor;
pub use worker_pool::{JobProcessor, WorkerPool, WorkerPoolConfig};
