//! Download error types.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure of a single recording attempt.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{stage} exited with {status}: {stderr}")]
    CaptureFailed {
        stage: &'static str,
        status: String,
        stderr: String,
    },

    #[error("ffprobe failed: {0}")]
    Probe(String),

    #[error("Recorded duration {recorded:.3}s differs from expected {expected}s")]
    DurationMismatch { recorded: f64, expected: u32 },

    #[error("IO error while {op} at {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DownloadError {
    pub fn spawn(program: &str, source: io::Error) -> Self {
        Self::Spawn {
            program: program.to_string(),
            source,
        }
    }

    pub fn io(op: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe(msg.into())
    }
}
