//! Subcommand implementations.

pub mod put_job_from_url;
pub mod put_jobs_from_schedule;
pub mod run_server;

use crate::Result;
use crate::cli::Command;
use crate::config::RecorderConfig;

/// Dispatch a parsed subcommand.
pub async fn execute(command: Command) -> Result<()> {
    match command {
        Command::RunServer(args) => run_server::run(RecorderConfig::from(&args)).await,
        Command::PutJobsFromScheduleByRules(args) => {
            put_jobs_from_schedule::run(&args.rules, &args.server_url).await
        }
        Command::PutJobFromUrl(args) => put_job_from_url::run(&args.url, &args.server_url).await,
    }
}
