//! The downloader: idempotent, verified capture of one job.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::engine::{CaptureEngine, DurationProbe, FfprobeProbe, StreamlinkEngine};
use super::error::DownloadError;
use super::naming::{self, Placement};
use crate::domain::{Job, RetryPolicy};
use crate::utils::filename::{is_name_too_long, sanitize_component};

/// Allowed difference between the probed and the nominal duration.
pub const DEFAULT_DURATION_TOLERANCE: Duration = Duration::from_secs(1);

/// What a successful download left on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// A new recording was placed at this path.
    Recorded(PathBuf),
    /// A recording already existed at this path; nothing was done.
    AlreadyRecorded(PathBuf),
}

impl DownloadOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Recorded(path) | Self::AlreadyRecorded(path) => path,
        }
    }
}

/// Records jobs into `out_root/<station>/<title>/`.
pub struct Downloader {
    engine: Arc<dyn CaptureEngine>,
    probe: Arc<dyn DurationProbe>,
    retry_policy: RetryPolicy,
    duration_tolerance: Duration,
}

impl Downloader {
    pub fn new(engine: Arc<dyn CaptureEngine>, probe: Arc<dyn DurationProbe>) -> Self {
        Self {
            engine,
            probe,
            retry_policy: RetryPolicy::default(),
            duration_tolerance: DEFAULT_DURATION_TOLERANCE,
        }
    }

    /// Downloader backed by streamlink, ffmpeg and ffprobe.
    pub fn with_external_tools() -> Self {
        Self::new(
            Arc::new(StreamlinkEngine::new()),
            Arc::new(FfprobeProbe::new()),
        )
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn with_duration_tolerance(mut self, tolerance: Duration) -> Self {
        self.duration_tolerance = tolerance;
        self
    }

    /// Record `job`, retrying failed attempts according to the retry policy.
    pub async fn download(
        &self,
        job: &Job,
        out_root: &Path,
    ) -> Result<DownloadOutcome, DownloadError> {
        let max_attempts = self.retry_policy.attempts();
        let mut attempt = 1;

        loop {
            match self.attempt(job, out_root).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if attempt < max_attempts => {
                    let delay = self.retry_policy.delay;
                    warn!(
                        "Attempt {}/{} to record {} failed: {}. Retrying in {:?}",
                        attempt, max_attempts, job, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        "Giving up on {} after {} attempts: {}",
                        job, max_attempts, e
                    );
                    return Err(e);
                }
            }
        }
    }

    async fn attempt(&self, job: &Job, out_root: &Path) -> Result<DownloadOutcome, DownloadError> {
        let dir = naming::target_dir(out_root, job);
        let candidates = naming::candidate_paths(&dir, &job.program);

        if let Some(existing) = find_existing(&candidates).await? {
            info!("Skipping {}: already recorded at {}", job, existing.display());
            return Ok(DownloadOutcome::AlreadyRecorded(existing));
        }

        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            if is_name_too_long(&e) {
                warn!(
                    "Title of {} is too long for a directory name on this filesystem",
                    job
                );
            }
            DownloadError::io("creating output directory", &dir, e)
        })?;

        // Removed on drop unless placed.
        let temp_path = tempfile::Builder::new()
            .prefix(&format!("{}-", sanitize_component(&job.program.id)))
            .suffix(".mp4.part")
            .tempfile_in(&dir)
            .map_err(|e| DownloadError::io("creating temporary file", &dir, e))?
            .into_temp_path();

        self.engine.capture(&job.url(), &temp_path).await?;

        let recorded = self.probe.probe_duration(&temp_path).await?;
        let expected = job.program.duration_secs;
        let drift = (recorded - f64::from(expected)).abs();
        if drift.is_nan() || drift > self.duration_tolerance.as_secs_f64() {
            return Err(DownloadError::DurationMismatch { recorded, expected });
        }
        debug!("Duration of {} verified: {:.3}s", job, recorded);

        let placement = naming::place_file(temp_path, &candidates)
            .map_err(|e| DownloadError::io("placing recording", &dir, e))?;
        match placement {
            Placement::Placed(placed) => {
                info!("Recorded {} to {}", job, placed.display());
                Ok(DownloadOutcome::Recorded(placed))
            }
            Placement::Occupied(existing) => {
                warn!(
                    "{} appeared at {} during capture; discarding the new recording",
                    job,
                    existing.display()
                );
                Ok(DownloadOutcome::AlreadyRecorded(existing))
            }
        }
    }
}

/// First candidate that already exists. Names too long to exist are skipped.
async fn find_existing(candidates: &[PathBuf]) -> Result<Option<PathBuf>, DownloadError> {
    for candidate in candidates {
        match tokio::fs::try_exists(candidate).await {
            Ok(true) => return Ok(Some(candidate.clone())),
            Ok(false) => {}
            Err(e) if is_name_too_long(&e) => {}
            Err(e) => return Err(DownloadError::io("checking for recording", candidate, e)),
        }
    }
    Ok(None)
}
