//! Command-line interface.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::client::DEFAULT_SERVER_URL;
use crate::logging::LoggingOptions;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Also write daily-rotated log files into this directory
    #[arg(long, global = true, env = "RECORDER_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn logging_options(&self) -> LoggingOptions {
        LoggingOptions {
            json: self.log_json,
            log_dir: self.log_dir.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the job queue API and record queued jobs
    RunServer(RunServerArgs),

    /// Queue every finished program that matches the given rules
    PutJobsFromScheduleByRules(PutJobsFromScheduleArgs),

    /// Queue the program behind a radiko timefree URL
    PutJobFromUrl(PutJobFromUrlArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunServerArgs {
    /// Root directory for recordings; must exist and be writable
    #[arg(long, env = "RECORDER_OUT_DIR")]
    pub out_dir: PathBuf,

    #[arg(long, env = "RECORDER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "RECORDER_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Allow cross-origin requests to the API
    #[arg(long, env = "RECORDER_ENABLE_CORS")]
    pub enable_cors: bool,

    /// Number of concurrent recordings
    #[arg(long, env = "RECORDER_NUM_WORKERS", default_value_t = 3)]
    pub num_workers: usize,

    /// Attempts per recording before giving up
    #[arg(long, env = "RECORDER_MAX_ATTEMPTS", default_value_t = 3)]
    pub max_attempts: u32,

    /// Pause between attempts, in seconds
    #[arg(long, env = "RECORDER_RETRY_DELAY_SECS", default_value_t = 10)]
    pub retry_delay_secs: u64,

    /// Incoming-webhook URL for completion and failure messages
    #[arg(long, env = "SLACK_WEBHOOK_URL")]
    pub webhook_url: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct PutJobsFromScheduleArgs {
    /// Rule files (YAML) or directories of rule files
    #[arg(required = true)]
    pub rules: Vec<PathBuf>,

    #[arg(long, env = "RECORDER_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    pub server_url: String,
}

#[derive(Args, Debug, Clone)]
pub struct PutJobFromUrlArgs {
    /// Timefree URL, e.g. https://radiko.jp/#!/ts/TBS/20240520010000
    pub url: String,

    #[arg(long, env = "RECORDER_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    pub server_url: String,
}
