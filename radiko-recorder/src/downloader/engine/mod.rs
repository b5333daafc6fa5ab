//! External tools that perform a capture and inspect its result.

pub mod ffprobe;
pub mod streamlink;
pub mod traits;

pub use ffprobe::FfprobeProbe;
pub use streamlink::StreamlinkEngine;
pub use traits::{CaptureEngine, DurationProbe};

/// Keep only the last `max_lines` lines of a tool's stderr.
pub(crate) fn stderr_tail(stderr: &[u8], max_lines: usize) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}
