//! Duration probing with ffprobe.

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

use super::stderr_tail;
use super::traits::DurationProbe;
use crate::downloader::DownloadError;

/// Reads the first audio stream's duration with `ffprobe`.
pub struct FfprobeProbe {
    ffprobe_path: String,
}

impl FfprobeProbe {
    /// Create a probe using `FFPROBE_PATH` or the `ffprobe` on `PATH`.
    pub fn new() -> Self {
        Self::with_path(std::env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()))
    }

    pub fn with_path(ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    fn build_args(path: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-select_streams".to_string(),
            "a:0".to_string(),
            "-show_entries".to_string(),
            "stream=duration".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            path.to_string_lossy().into_owned(),
        ]
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the duration from `ffprobe -print_format json` output.
pub fn parse_probe_output(output: &str) -> Result<f64, DownloadError> {
    let value: Value = serde_json::from_str(output)
        .map_err(|e| DownloadError::probe(format!("Invalid ffprobe output: {}", e)))?;

    let stream = value
        .get("streams")
        .and_then(Value::as_array)
        .and_then(|streams| streams.first())
        .ok_or_else(|| DownloadError::probe("No audio streams found"))?;

    let duration = stream
        .get("duration")
        .ok_or_else(|| DownloadError::probe("Duration not found"))?;

    let parsed = match duration {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed
        .filter(|d| d.is_finite())
        .ok_or_else(|| DownloadError::probe(format!("Invalid duration value: {}", duration)))
}

#[async_trait]
impl DurationProbe for FfprobeProbe {
    async fn probe_duration(&self, path: &Path) -> Result<f64, DownloadError> {
        let output = process_utils::managed_tokio_command(&self.ffprobe_path)
            .args(Self::build_args(path))
            .output()
            .await
            .map_err(|e| DownloadError::spawn(&self.ffprobe_path, e))?;

        if !output.status.success() {
            return Err(DownloadError::probe(format!(
                "ffprobe exited with {}: {}",
                output.status,
                stderr_tail(&output.stderr, 5)
            )));
        }

        let duration = parse_probe_output(&String::from_utf8_lossy(&output.stdout))?;
        debug!("Probed {}: {:.3}s", path.display(), duration);
        Ok(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_string() {
        let output = r#"{"programs": [], "streams": [{"duration": "3600.023220"}]}"#;
        let duration = parse_probe_output(output).unwrap();
        assert!((duration - 3600.02322).abs() < 1e-6);
    }

    #[test]
    fn test_parse_duration_number() {
        let output = r#"{"streams": [{"duration": 59.5}]}"#;
        assert_eq!(parse_probe_output(output).unwrap(), 59.5);
    }

    #[test]
    fn test_no_audio_streams() {
        for output in [r#"{"streams": []}"#, r#"{}"#] {
            let err = parse_probe_output(output).unwrap_err();
            assert_eq!(err.to_string(), "ffprobe failed: No audio streams found");
        }
    }

    #[test]
    fn test_duration_missing() {
        let err = parse_probe_output(r#"{"streams": [{}]}"#).unwrap_err();
        assert_eq!(err.to_string(), "ffprobe failed: Duration not found");
    }

    #[test]
    fn test_invalid_output() {
        assert!(parse_probe_output("not json").is_err());
        assert!(parse_probe_output(r#"{"streams": [{"duration": "N/A"}]}"#).is_err());
    }

    #[test]
    fn test_non_finite_duration_is_rejected() {
        for duration in ["NaN", "inf", "-infinity"] {
            let output = format!(r#"{{"streams": [{{"duration": "{}"}}]}}"#, duration);
            let err = parse_probe_output(&output).unwrap_err();
            assert!(err.to_string().contains("Invalid duration value"), "{}", err);
        }
    }

    #[test]
    fn test_args_select_first_audio_stream() {
        let args = FfprobeProbe::build_args(Path::new("a.mp4"));
        assert_eq!(
            args.join(" "),
            "-v error -select_streams a:0 -show_entries stream=duration -print_format json a.mp4"
        );
    }
}
