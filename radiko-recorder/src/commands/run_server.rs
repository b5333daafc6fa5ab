//! `run-server`: API server plus recording workers.

use std::sync::Arc;
use tracing::info;

use crate::Result;
use crate::api::{ApiServer, AppState};
use crate::config::RecorderConfig;
use crate::domain::Job;
use crate::downloader::Downloader;
use crate::notification::WebhookNotifier;
use crate::pipeline::{Ingress, JobQueue, RecordingProcessor, WorkerPool};

pub async fn run(config: RecorderConfig) -> Result<()> {
    config.validate()?;
    info!(
        "Recording into {} with {} workers",
        config.out_dir.display(),
        config.workers.num_workers
    );

    let queue: Arc<JobQueue<Job>> = Arc::new(JobQueue::new());

    let downloader =
        Arc::new(Downloader::with_external_tools().with_retry_policy(config.retry));
    let mut processor = RecordingProcessor::new(downloader, config.out_dir.clone());
    if let Some(webhook) = &config.webhook {
        processor = processor.with_notifier(Arc::new(WebhookNotifier::new(webhook.clone())?));
    }

    let pool = WorkerPool::new(config.workers.clone(), queue.clone(), Arc::new(processor))?;
    pool.start();

    let server = ApiServer::new(config.api.clone(), AppState::new(Ingress::new(queue)));
    let cancel_token = server.cancel_token();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        cancel_token.cancel();
    });

    let result = server.run().await;
    info!(
        "Stopping workers with {} recordings in progress",
        pool.busy_count()
    );
    pool.stop().await;
    result
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
