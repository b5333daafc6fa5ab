//! Job processor used by the recording worker pool.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use super::worker_pool::JobProcessor;
use crate::Result;
use crate::domain::Job;
use crate::downloader::{DownloadOutcome, Downloader};
use crate::notification::Notifier;

/// Records a job and reports the result to an optional notifier.
pub struct RecordingProcessor {
    downloader: Arc<Downloader>,
    out_dir: PathBuf,
    notifier: Option<Arc<dyn Notifier>>,
}

impl RecordingProcessor {
    pub fn new(downloader: Arc<Downloader>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            downloader,
            out_dir: out_dir.into(),
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Send a message, logging instead of failing when delivery breaks.
    async fn notify(&self, message: &str) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        if let Err(e) = notifier.notify(message).await {
            warn!(
                "Failed to send {} notification: {}",
                notifier.channel_type(),
                e
            );
        }
    }
}

#[async_trait]
impl JobProcessor<Job> for RecordingProcessor {
    async fn process(&self, job: &Job) -> Result<()> {
        match self.downloader.download(job, &self.out_dir).await {
            Ok(DownloadOutcome::Recorded(path)) => {
                self.notify(&format!("Successfully downloaded {}", path.display()))
                    .await;
                Ok(())
            }
            Ok(DownloadOutcome::AlreadyRecorded(path)) => {
                info!("{} was already recorded at {}", job, path.display());
                Ok(())
            }
            Err(e) => {
                self.notify(&format!("Failed to download {}: {}", job.url(), e))
                    .await;
                Err(e.into())
            }
        }
    }
}
