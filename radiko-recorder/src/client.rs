//! HTTP client for submitting jobs to a running recorder.

use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, info};

use crate::domain::Job;
use crate::utils::http_client::build_http_client;
use crate::{Error, Result};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// Result of a successful submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutJobOutcome {
    Created,
    AlreadyExists,
}

pub struct RecorderClient {
    client: reqwest::Client,
    server_url: String,
}

impl RecorderClient {
    pub fn new(server_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_http_client(Duration::from_secs(30))?,
            server_url: server_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn job_queue_url(&self) -> String {
        format!("{}/job_queue", self.server_url)
    }

    /// Submit a job. A conflict means the server already knows the job.
    pub async fn put_job(&self, job: &Job) -> Result<PutJobOutcome> {
        let response = self
            .client
            .post(self.job_queue_url())
            .json(job)
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED => {
                debug!("Submitted {}", job);
                Ok(PutJobOutcome::Created)
            }
            StatusCode::CONFLICT => {
                info!("Job already queued: {}", job);
                Ok(PutJobOutcome::AlreadyExists)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::Http(format!(
                    "Unexpected response {} for {}: {}",
                    status, job, body
                )))
            }
        }
    }
}
