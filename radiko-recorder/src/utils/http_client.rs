use std::{sync::OnceLock, time::Duration};

use tracing::debug;

use crate::Result;

/// User agent sent with every outgoing request.
pub const USER_AGENT: &str = concat!("radiko-recorder/", env!("CARGO_PKG_VERSION"));

pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Another crate may have installed one first.
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// Build a `reqwest::Client` with the shared TLS provider and a request timeout.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    install_rustls_provider();
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?)
}
