//! Server configuration assembled from the command line and environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::api::ApiServerConfig;
use crate::cli::RunServerArgs;
use crate::domain::RetryPolicy;
use crate::notification::WebhookConfig;
use crate::pipeline::WorkerPoolConfig;
use crate::utils::fs;
use crate::{Error, Result};

/// Everything `run-server` needs.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Root directory for recordings.
    pub out_dir: PathBuf,
    pub api: ApiServerConfig,
    pub workers: WorkerPoolConfig,
    pub retry: RetryPolicy,
    pub webhook: Option<WebhookConfig>,
}

impl RecorderConfig {
    /// Check the values that would otherwise only fail once a job runs.
    pub fn validate(&self) -> Result<()> {
        if self.workers.num_workers == 0 {
            return Err(Error::config("num_workers must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::config("max_attempts must be at least 1"));
        }
        fs::ensure_writable_dir(&self.out_dir)
    }
}

impl From<&RunServerArgs> for RecorderConfig {
    fn from(args: &RunServerArgs) -> Self {
        Self {
            out_dir: args.out_dir.clone(),
            api: ApiServerConfig {
                bind_address: args.host.clone(),
                port: args.port,
                enable_cors: args.enable_cors,
                ..Default::default()
            },
            workers: WorkerPoolConfig {
                num_workers: args.num_workers,
            },
            retry: RetryPolicy::fixed(args.max_attempts, Duration::from_secs(args.retry_delay_secs)),
            webhook: args
                .webhook_url
                .as_ref()
                .filter(|url| !url.trim().is_empty())
                .map(WebhookConfig::new),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(out_dir: PathBuf) -> RunServerArgs {
        RunServerArgs {
            out_dir,
            host: "0.0.0.0".to_string(),
            port: 9000,
            enable_cors: true,
            num_workers: 2,
            max_attempts: 3,
            retry_delay_secs: 5,
            webhook_url: Some(String::new()),
        }
    }

    #[test]
    fn test_from_args() {
        let dir = tempfile::tempdir().unwrap();
        let config = RecorderConfig::from(&args(dir.path().to_path_buf()));
        assert_eq!(config.api.bind_address, "0.0.0.0");
        assert_eq!(config.api.port, 9000);
        assert!(config.api.enable_cors);
        assert_eq!(config.workers.num_workers, 2);
        assert_eq!(config.retry.delay, Duration::from_secs(5));
        assert!(config.webhook.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_retry_delay_is_not_capped() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path().to_path_buf());
        args.retry_delay_secs = 900;
        assert_eq!(
            RecorderConfig::from(&args).retry.delay,
            Duration::from_secs(900)
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let dir = tempfile::tempdir().unwrap();

        let mut config = RecorderConfig::from(&args(dir.path().to_path_buf()));
        config.workers.num_workers = 0;
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));

        let config = RecorderConfig::from(&args(dir.path().join("missing")));
        assert!(config.validate().is_err());
    }
}
