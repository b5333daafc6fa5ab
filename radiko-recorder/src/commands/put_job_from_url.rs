//! `put-job-from-url`: queue the program behind a timefree URL.

use tracing::info;

use crate::Result;
use crate::client::{PutJobOutcome, RecorderClient};
use crate::schedule::RadikoClient;

pub async fn run(url: &str, server_url: &str) -> Result<()> {
    let job = RadikoClient::new()?.find_job_by_url(url).await?;
    info!("Found {}", job);

    match RecorderClient::new(server_url)?.put_job(&job).await? {
        PutJobOutcome::Created => info!("Queued {}", job),
        PutJobOutcome::AlreadyExists => {}
    }
    Ok(())
}
