//! HTTP server for the webhook receiver
//!
//! Owns the listener and the shutdown channel; routes are assembled by
//! `build_router` so tests can drive them without a socket.

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::webhook::handlers;
use crate::webhook::rate_limiter::{rate_limit_middleware, RateLimiterState};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Build the application router with middleware attached
pub fn build_router(state: Arc<AppState>) -> Router {
    let rate_limiter = Arc::new(RateLimiterState::new(
        state.settings.api_rate_limit,
        state.settings.webhook_rate_limit,
    ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut webhooks: Router<Arc<AppState>> = Router::new()
        .route("/tradingview", post(handlers::tradingview_webhook))
        .route("/status", get(handlers::webhook_status))
        .route("/test", get(handlers::routing_test));

    if state.settings.is_development() {
        webhooks = webhooks.route("/debug", post(handlers::debug_webhook));
    }

    // /health is merged after the rate limiter and never draws a token
    let health = Router::new()
        .route("/health", get(handlers::health_check))
        .with_state(state.clone());

    Router::new()
        .route("/", get(handlers::root))
        .nest("/api/v1/webhooks", webhooks)
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(middleware::from_fn_with_state(rate_limiter, rate_limit_middleware))
        .merge(health)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Webhook server manager
pub struct WebhookServer {
    state: Arc<AppState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl WebhookServer {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            shutdown_tx: None,
            task: None,
        }
    }

    /// Bind and start serving in the background; returns the bound address
    pub async fn start(&mut self) -> Result<SocketAddr> {
        let addr = self.state.settings.bind_addr()?;

        info!(
            "Rate limits: webhook={}/s, api={}/s (0 = unlimited)",
            self.state.settings.webhook_rate_limit, self.state.settings.api_rate_limit
        );

        let app = build_router(self.state.clone());

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::Config(format!("Failed to bind to {}: {}", addr, e)))?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        info!("Starting {} on {}", crate::config::SERVICE_NAME, local_addr);

        self.task = Some(tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Webhook server shutting down");
            });

            if let Err(e) = server.await {
                error!("Webhook server error: {}", e);
            }
        }));

        info!("=== Endpoints ===");
        info!("  GET  http://{}/", local_addr);
        info!("  GET  http://{}/health", local_addr);
        info!("  POST http://{}{}", local_addr, handlers::WEBHOOK_PATH);
        info!("  GET  http://{}{}", local_addr, handlers::STATUS_PATH);
        if self.state.settings.is_development() {
            info!("  POST http://{}/api/v1/webhooks/debug", local_addr);
        }
        if self.state.settings.webhook_secret_configured() {
            info!("Webhook signatures required (X-Webhook-Signature)");
        }

        Ok(local_addr)
    }

    /// Signal the server to stop accepting connections
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            info!("Webhook server stop signal sent");
        }
    }

    /// Wait for the serving task to finish draining
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Webhook server task failed: {}", e);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some()
    }
}

impl Drop for WebhookServer {
    fn drop(&mut self) {
        self.stop();
    }
}
