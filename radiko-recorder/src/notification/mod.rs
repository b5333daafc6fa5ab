//! Best-effort notifications about finished recordings.

pub mod webhook;

use async_trait::async_trait;

use crate::Result;

pub use webhook::{WebhookConfig, WebhookNotifier};

/// A destination for human-readable status messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Get the channel type name.
    fn channel_type(&self) -> &'static str;

    /// Deliver a message.
    async fn notify(&self, message: &str) -> Result<()>;
}
