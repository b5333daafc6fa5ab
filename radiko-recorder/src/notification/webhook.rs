//! Incoming-webhook notifier (Slack compatible).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use super::Notifier;
use crate::Result;
use crate::utils::http_client::build_http_client;

/// Webhook configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL.
    pub url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Posts `{"text": message}` to a webhook URL.
pub struct WebhookNotifier {
    config: WebhookConfig,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(config: WebhookConfig) -> Result<Self> {
        let client = build_http_client(Duration::from_secs(config.timeout_secs))?;
        Ok(Self { config, client })
    }

    fn build_payload(message: &str) -> serde_json::Value {
        json!({ "text": message })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn channel_type(&self) -> &'static str {
        "webhook"
    }

    async fn notify(&self, message: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.config.url)
            .json(&Self::build_payload(message))
            .send()
            .await
            .map_err(|e| crate::Error::Other(format!("Webhook request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Webhook failed: {} - {}", status, body);
            return Err(crate::Error::Other(format!(
                "Webhook failed: {} - {}",
                status, body
            )));
        }

        debug!("Webhook notification sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_config_defaults() {
        let config: WebhookConfig =
            serde_json::from_str(r#"{"url": "https://hooks.example.com/T0"}"#).unwrap();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(WebhookConfig::new("x").timeout_secs, 30);
    }

    #[test]
    fn test_payload_shape() {
        assert_eq!(
            WebhookNotifier::build_payload("Successfully downloaded a.mp4"),
            json!({"text": "Successfully downloaded a.mp4"})
        );
    }

    #[tokio::test]
    async fn test_unreachable_webhook_is_error() {
        let notifier = WebhookNotifier::new(WebhookConfig {
            url: "http://127.0.0.1:1/hook".to_string(),
            timeout_secs: 2,
        })
        .unwrap();
        assert_eq!(notifier.channel_type(), "webhook");
        assert!(notifier.notify("hello").await.is_err());
    }
}
