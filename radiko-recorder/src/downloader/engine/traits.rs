use async_trait::async_trait;
use std::path::Path;

use crate::downloader::DownloadError;

/// Records a stream URL into a local file.
#[async_trait]
pub trait CaptureEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Capture `url` into `output`, overwriting it.
    ///
    /// Dropping the returned future must stop any spawned process.
    async fn capture(&self, url: &str, output: &Path) -> Result<(), DownloadError>;
}

/// Measures the duration of a recorded file.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    /// Duration of the first audio stream in seconds.
    async fn probe_duration(&self, path: &Path) -> Result<f64, DownloadError>;
}
