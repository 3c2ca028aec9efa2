//! Proxy Server - Axum HTTP server

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{ApiKey, Config};
use crate::proxy::handlers::{nanobana, storage};
use crate::proxy::upstream::{Endpoints, UpstreamClient};

/// Application state shared across handlers. Built once at startup and never mutated.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<UpstreamClient>,
    pub endpoints: Arc<Endpoints>,
    pub api_key: Option<ApiKey>,
}

impl AppState {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            upstream: Arc::new(UpstreamClient::new(config)?),
            endpoints: Arc::new(Endpoints::from_config(&config.upstream)?),
            api_key: config.api_key.clone(),
        })
    }
}

/// Build the axum router with every gateway route
pub fn build_router(state: AppState, body_limit: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check_handler))

        // Generation queue
        .route("/api/nanobana", post(nanobana::handle_generate))
        .route("/api/nanobana/requests/:request_id/status", get(nanobana::handle_generation_status))
        .route("/api/nanobana/requests/:request_id", get(nanobana::handle_generation_result))

        // Edit queue
        .route("/api/nanobana/edit", post(nanobana::handle_edit))
        .route("/api/nanobana/edit/requests/:request_id/status", get(nanobana::handle_edit_status))
        .route("/api/nanobana/edit/requests/:request_id", get(nanobana::handle_edit_result))

        // Storage
        .route("/api/storage/upload", post(storage::handle_upload))

        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Proxy server instance
pub struct ProxyServer {
    host: String,
    port: u16,
    body_limit: usize,
    state: AppState,
}

impl ProxyServer {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            host: config.server.host.clone(),
            port: config.server.port,
            body_limit: config.server.body_limit_bytes(),
            state: AppState::from_config(config)?,
        })
    }

    /// Run the proxy server (blocking)
    pub async fn run(self) -> anyhow::Result<()> {
        if self.state.api_key.is_none() {
            tracing::warn!("FAL_API_KEY is not set; upstream routes will answer 500 until it is configured");
        }

        let app = build_router(self.state, self.body_limit);

        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        tracing::info!("Proxy server running on {}", addr);
        tracing::info!("Health check: http://localhost:{}/health", self.port);
        tracing::info!("API endpoint: http://localhost:{}/api/nanobana", self.port);
        tracing::info!("Edit endpoint: http://localhost:{}/api/nanobana/edit", self.port);
        tracing::info!("Upload endpoint: http://localhost:{}/api/storage/upload", self.port);

        // Handle graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Proxy server stopped");
        Ok(())
    }
}

/// Health check handler. Never touches upstream.
async fn health_check_handler() -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({"status": "ok", "message": "Proxy server is running"})),
    )
        .into_response()
}

/// Shutdown signal handler
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received");
}
