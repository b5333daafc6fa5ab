//! Submission entry point in front of the job queue.

use std::sync::Arc;
use tracing::{info, warn};

use super::job_queue::JobQueue;
use crate::domain::Job;

/// Result of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted(Job),
    Duplicate(Job),
    Invalid(String),
}

/// Validates submissions and hands them to the queue.
#[derive(Clone)]
pub struct Ingress {
    queue: Arc<JobQueue<Job>>,
}

impl Ingress {
    pub fn new(queue: Arc<JobQueue<Job>>) -> Self {
        Self { queue }
    }

    pub fn queue(&self) -> &Arc<JobQueue<Job>> {
        &self.queue
    }

    /// Queue a job after structural validation.
    pub fn submit(&self, job: Job) -> SubmitOutcome {
        if let Err(e) = job.validate() {
            warn!("Rejected invalid job {}: {}", job, e);
            return SubmitOutcome::Invalid(e.to_string());
        }

        match self.queue.put(job.clone()) {
            Ok(()) => SubmitOutcome::Accepted(job),
            Err(e) => {
                info!("{}", e);
                SubmitOutcome::Duplicate(job)
            }
        }
    }

    /// Decode a JSON job document and submit it.
    pub fn submit_json(&self, body: &[u8]) -> SubmitOutcome {
        match serde_json::from_slice::<Job>(body) {
            Ok(job) => self.submit(job),
            Err(e) => {
                warn!("Rejected malformed job submission: {}", e);
                SubmitOutcome::Invalid(format!("Malformed job: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Program, parse_radiko_timestamp};

    fn job() -> Job {
        Job::new(
            Program {
                id: "p1".to_string(),
                start: parse_radiko_timestamp("20240101000000").unwrap(),
                end: parse_radiko_timestamp("20240101010000").unwrap(),
                duration_secs: 3600,
                title: "Title".to_string(),
                performer: None,
            },
            "TBS",
        )
    }

    #[test]
    fn test_submit_accepts_then_reports_duplicate() {
        let ingress = Ingress::new(Arc::new(JobQueue::new()));
        assert_eq!(ingress.submit(job()), SubmitOutcome::Accepted(job()));
        assert_eq!(ingress.submit(job()), SubmitOutcome::Duplicate(job()));
        assert_eq!(ingress.queue().size(), 1);
    }

    #[test]
    fn test_submit_rejects_invalid_without_queueing() {
        let ingress = Ingress::new(Arc::new(JobQueue::new()));
        let mut bad = job();
        bad.station_id.clear();
        assert!(matches!(ingress.submit(bad), SubmitOutcome::Invalid(_)));
        assert_eq!(ingress.queue().size(), 0);
    }

    #[test]
    fn test_submit_json() {
        let ingress = Ingress::new(Arc::new(JobQueue::new()));
        let body = serde_json::to_vec(&job()).unwrap();
        assert!(matches!(
            ingress.submit_json(&body),
            SubmitOutcome::Accepted(_)
        ));
        assert!(matches!(
            ingress.submit_json(br#"{"station_id": "TBS"}"#),
            SubmitOutcome::Invalid(_)
        ));
        assert!(matches!(
            ingress.submit_json(b"not json"),
            SubmitOutcome::Invalid(_)
        ));
        assert_eq!(ingress.queue().size(), 1);
    }
}
