//! API server setup and configuration.

use axum::Router;
use axum::extract::{DefaultBodyLimit, Request};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::api::routes;
use crate::error::{Error, Result};
use crate::pipeline::Ingress;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Server bind address
    pub bind_address: String,
    /// Server port
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Request body size limit in bytes
    pub body_limit: usize,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8000,
            enable_cors: false,
            body_limit: 64 * 1024,
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Server start time for uptime calculation
    pub start_time: Instant,
    /// Submission entry point (and through it, the job queue)
    pub ingress: Ingress,
}

impl AppState {
    pub fn new(ingress: Ingress) -> Self {
        Self {
            start_time: Instant::now(),
            ingress,
        }
    }
}

/// API server.
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
    cancel_token: CancellationToken,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, state: AppState) -> Self {
        Self {
            config,
            state,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Get the cancellation token for graceful shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Build the router with all middleware and routes.
    pub fn build_router(&self) -> Router {
        let mut router = routes::create_router(self.state.clone())
            .layer(DefaultBodyLimit::max(self.config.body_limit));

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router = router.layer(cors);
        }

        router.layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request| {
                    if req.uri().path().starts_with("/health") {
                        Span::none()
                    } else {
                        let mut make_span =
                            tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO);
                        use tower_http::trace::MakeSpan;
                        make_span.make_span(req)
                    }
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        if span.is_disabled() {
                            return;
                        }
                        let on_response =
                            tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO);
                        use tower_http::trace::OnResponse;
                        on_response.on_response(res, latency, span);
                    },
                ),
        )
    }

    /// Run the server until the cancellation token fires.
    ///
    /// The bind address may be a host name (`localhost`) or an IPv4/IPv6 literal.
    pub async fn run(&self) -> Result<()> {
        let host = self.config.bind_address.as_str();
        let listener = TcpListener::bind((host, self.config.port))
            .await
            .map_err(|e| {
                Error::ApiError(format!(
                    "Failed to bind {} port {}: {}",
                    host, self.config.port, e
                ))
            })?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let router = self.build_router();
        if let Ok(addr) = listener.local_addr() {
            tracing::info!("API server listening on http://{}", addr);
        }

        let cancel_token = self.cancel_token.clone();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                tracing::info!("API server shutting down...");
            })
            .await
            .map_err(|e| Error::ApiError(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::JobQueue;
    use std::sync::Arc;

    #[test]
    fn test_default_config() {
        let config = ApiServerConfig::default();
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.port, 8000);
    }

    #[tokio::test]
    async fn test_invalid_address_is_rejected() {
        let server = ApiServer::new(
            ApiServerConfig {
                bind_address: "not an address".to_string(),
                ..Default::default()
            },
            AppState::new(Ingress::new(Arc::new(JobQueue::new()))),
        );
        assert!(matches!(server.run().await, Err(Error::ApiError(_))));
    }

    #[rstest::rstest]
    #[case("localhost")]
    #[case("::1")]
    #[case("127.0.0.1")]
    #[tokio::test]
    async fn test_run_accepts_host_names_and_literals(#[case] host: &str) {
        // Skip hosts this machine cannot bind (e.g. no IPv6 loopback).
        if std::net::TcpListener::bind((host, 0)).is_err() {
            return;
        }

        let server = Arc::new(ApiServer::new(
            ApiServerConfig {
                bind_address: host.to_string(),
                port: 0,
                ..Default::default()
            },
            AppState::new(Ingress::new(Arc::new(JobQueue::new()))),
        ));

        let handle = {
            let server = server.clone();
            tokio::spawn(async move { server.run().await })
        };
        server.shutdown();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let server = Arc::new(ApiServer::new(
            ApiServerConfig::default(),
            AppState::new(Ingress::new(Arc::new(JobQueue::new()))),
        ));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let handle = {
            let server = server.clone();
            tokio::spawn(async move { server.serve(listener).await })
        };
        server.shutdown();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
