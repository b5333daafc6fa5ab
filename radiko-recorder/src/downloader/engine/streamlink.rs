//! Streamlink capture engine.
//!
//! Streamlink resolves the timefree URL and writes the raw stream to stdout,
//! which is handed directly to ffmpeg's stdin for remuxing into MP4:
//!
//! ```text
//! streamlink <url> best -O | ffmpeg -i - -c copy -f mp4 -y <output>
//! ```

use async_trait::async_trait;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tracing::{debug, info};

use super::stderr_tail;
use super::traits::CaptureEngine;
use crate::downloader::DownloadError;

const STDERR_TAIL_LINES: usize = 20;

/// Streamlink-based capture engine.
pub struct StreamlinkEngine {
    /// Path to the streamlink binary.
    streamlink_path: String,
    /// Path to ffmpeg binary (for remuxing).
    ffmpeg_path: String,
}

impl StreamlinkEngine {
    /// Create an engine using `STREAMLINK_PATH` / `FFMPEG_PATH` or the binaries on `PATH`.
    pub fn new() -> Self {
        let streamlink_path =
            std::env::var("STREAMLINK_PATH").unwrap_or_else(|_| "streamlink".to_string());
        let ffmpeg_path = std::env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string());
        Self::with_paths(streamlink_path, ffmpeg_path)
    }

    pub fn with_paths(streamlink_path: impl Into<String>, ffmpeg_path: impl Into<String>) -> Self {
        Self {
            streamlink_path: streamlink_path.into(),
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    fn build_streamlink_args(url: &str) -> Vec<String> {
        vec![url.to_string(), "best".to_string(), "-O".to_string()]
    }

    fn build_ffmpeg_args(output: &Path) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            "-".to_string(),
            "-c".to_string(),
            "copy".to_string(),
            "-f".to_string(),
            "mp4".to_string(),
            "-y".to_string(),
            output.to_string_lossy().into_owned(),
        ]
    }
}

impl Default for StreamlinkEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn check_stage(stage: &'static str, status: ExitStatus, stderr: &[u8]) -> Result<(), DownloadError> {
    if status.success() {
        return Ok(());
    }
    Err(DownloadError::CaptureFailed {
        stage,
        status: status.to_string(),
        stderr: stderr_tail(stderr, STDERR_TAIL_LINES),
    })
}

#[async_trait]
impl CaptureEngine for StreamlinkEngine {
    fn name(&self) -> &'static str {
        "streamlink"
    }

    async fn capture(&self, url: &str, output: &Path) -> Result<(), DownloadError> {
        info!("Starting capture of {} into {}", url, output.display());

        let mut streamlink = process_utils::managed_tokio_command(&self.streamlink_path)
            .args(Self::build_streamlink_args(url))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DownloadError::spawn(&self.streamlink_path, e))?;

        let stdout = streamlink.stdout.take().ok_or_else(|| {
            DownloadError::spawn(
                &self.streamlink_path,
                std::io::Error::other("stdout was not captured"),
            )
        })?;
        let pipe = TryInto::<Stdio>::try_into(stdout)
            .map_err(|e| DownloadError::spawn(&self.streamlink_path, e))?;

        // If this fails, dropping `streamlink` kills it.
        let ffmpeg = process_utils::managed_tokio_command(&self.ffmpeg_path)
            .args(Self::build_ffmpeg_args(output))
            .stdin(pipe)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DownloadError::spawn(&self.ffmpeg_path, e))?;

        let (streamlink_output, ffmpeg_output) =
            tokio::join!(streamlink.wait_with_output(), ffmpeg.wait_with_output());

        let streamlink_output =
            streamlink_output.map_err(|e| DownloadError::io("waiting for streamlink", output, e))?;
        let ffmpeg_output =
            ffmpeg_output.map_err(|e| DownloadError::io("waiting for ffmpeg", output, e))?;

        check_stage("streamlink", streamlink_output.status, &streamlink_output.stderr)?;
        check_stage("ffmpeg", ffmpeg_output.status, &ffmpeg_output.stderr)?;

        debug!("Capture of {} finished", url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streamlink_args() {
        assert_eq!(
            StreamlinkEngine::build_streamlink_args("https://radiko.jp/#!/ts/TBS/20240101000000"),
            vec!["https://radiko.jp/#!/ts/TBS/20240101000000", "best", "-O"]
        );
    }

    #[test]
    fn test_ffmpeg_args_end_with_output() {
        let args = StreamlinkEngine::build_ffmpeg_args(Path::new("/out/a.mp4.part"));
        assert_eq!(args.last().map(String::as_str), Some("/out/a.mp4.part"));
        let joined = args.join(" ");
        assert!(joined.contains("-i - -c copy -f mp4 -y"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let engine = StreamlinkEngine::with_paths(
            "/nonexistent/streamlink-binary",
            "/nonexistent/ffmpeg-binary",
        );
        let dir = tempfile::tempdir().unwrap();
        let err = engine
            .capture("https://radiko.jp/", &dir.path().join("out.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_stage_reports_exit_status() {
        // `false` exits with 1 and `true` succeeds, so only the first stage fails.
        let engine = StreamlinkEngine::with_paths("false", "true");
        let dir = tempfile::tempdir().unwrap();
        let err = engine
            .capture("https://radiko.jp/", &dir.path().join("out.mp4"))
            .await
            .unwrap_err();
        match err {
            DownloadError::CaptureFailed { stage, .. } => assert_eq!(stage, "streamlink"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(target_os = "linux")]
    fn sleeper_script(dir: &Path, name: &str) -> (String, std::path::PathBuf) {
        use std::os::unix::fs::PermissionsExt;

        let pid_file = dir.join(format!("{}.pid", name));
        let script = dir.join(name);
        std::fs::write(
            &script,
            format!("#!/bin/sh\necho $$ > '{}'\nexec sleep 30\n", pid_file.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        (script.to_string_lossy().into_owned(), pid_file)
    }

    #[cfg(target_os = "linux")]
    async fn read_pid(pid_file: &Path) -> u32 {
        loop {
            if let Ok(contents) = tokio::fs::read_to_string(pid_file).await {
                if let Ok(pid) = contents.trim().parse() {
                    return pid;
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
    }

    /// Exited processes either vanish from /proc or linger as zombies.
    #[cfg(target_os = "linux")]
    fn is_running(pid: u32) -> bool {
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Ok(stat) => {
                let state = stat.rsplit(')').next().and_then(|rest| rest.trim().chars().next());
                !matches!(state, Some('Z') | Some('X'))
            }
            Err(_) => false,
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_cancelled_capture_kills_both_stages() {
        let dir = tempfile::tempdir().unwrap();
        let (streamlink, streamlink_pid_file) = sleeper_script(dir.path(), "streamlink");
        let (ffmpeg, ffmpeg_pid_file) = sleeper_script(dir.path(), "ffmpeg");
        let engine = StreamlinkEngine::with_paths(streamlink, ffmpeg);
        let output = dir.path().join("out.mp4");

        let mut capture = engine.capture("https://radiko.jp/", &output);
        let pids = tokio::time::timeout(std::time::Duration::from_secs(10), async {
            tokio::select! {
                _ = &mut capture => panic!("capture finished while its stages were sleeping"),
                pids = async {
                    (read_pid(&streamlink_pid_file).await, read_pid(&ffmpeg_pid_file).await)
                } => pids,
            }
        })
        .await
        .expect("both stages should start");

        assert!(is_running(pids.0));
        assert!(is_running(pids.1));
        drop(capture);

        for _ in 0..250 {
            if !is_running(pids.0) && !is_running(pids.1) {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("stages still running after the capture was dropped");
    }
}
