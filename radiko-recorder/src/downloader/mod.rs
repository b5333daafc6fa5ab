//! Recording of a single job.
//!
//! - `engine`: external tools (streamlink + ffmpeg capture, ffprobe probe)
//! - `naming`: output directory, candidate file names and fallback placement
//! - `recorder`: the [`Downloader`] tying them together with retries

pub mod engine;
pub mod error;
pub mod naming;
pub mod recorder;

pub use engine::{CaptureEngine, DurationProbe, FfprobeProbe, StreamlinkEngine};
pub use error::DownloadError;
pub use recorder::{DownloadOutcome, Downloader};
