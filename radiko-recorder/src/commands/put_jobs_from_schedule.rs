//! `put-jobs-from-schedule-by-rules`: queue finished programs selected by rules.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{error, info};

use crate::Result;
use crate::client::{PutJobOutcome, RecorderClient};
use crate::domain::{Job, RuleSet};
use crate::schedule::RadikoClient;

pub async fn run(rule_paths: &[PathBuf], server_url: &str) -> Result<()> {
    let rules = RuleSet::from_yaml_paths(rule_paths).await?;
    info!("Loaded {} rules", rules.len());

    let radiko = RadikoClient::new()?;
    let client = RecorderClient::new(server_url)?;

    let jobs = select_jobs(radiko.fetch_recent_jobs().await?, &rules, Utc::now());
    info!("{} programs match the rules", jobs.len());

    let mut created = 0;
    for job in &jobs {
        match client.put_job(job).await {
            Ok(PutJobOutcome::Created) => {
                info!("Queued {}", job);
                created += 1;
            }
            Ok(PutJobOutcome::AlreadyExists) => {}
            Err(e) => error!("Failed to queue {}: {}", job, e),
        }
    }

    info!("Queued {} new jobs", created);
    Ok(())
}

/// Finished programs accepted by the rules, in priority order.
pub fn select_jobs(
    jobs: impl IntoIterator<Item = Job>,
    rules: &RuleSet,
    now: DateTime<Utc>,
) -> Vec<Job> {
    let mut selected: Vec<Job> = jobs
        .into_iter()
        .filter(|job| job.is_ready_at(now))
        .filter(|job| rules.matches(&job.station_id, &job.program))
        .collect();
    selected.sort();
    selected.dedup();
    selected
}
