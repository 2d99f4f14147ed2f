//! Webhook server module
//!
//! Provides:
//! - TradingView alert intake (POST /api/v1/webhooks/tradingview)
//! - Service acknowledgement and health probes (/ and /health)
//! - Webhook subsystem status (GET /api/v1/webhooks/status)
//!
//! Usage:
//! 1. Set HOST/PORT (and optionally WEBHOOK_SECRET, FORWARD_URL) in `.env`
//! 2. Start the `amoeba-backend` binary
//! 3. Point the TradingView alert webhook URL at
//!    `<public_url>/api/v1/webhooks/tradingview`

mod server;
pub mod handlers;
pub mod rate_limiter;
mod types;

pub use server::{build_router, WebhookServer};
pub use types::{
    DebugEcho,
    EndpointMap,
    HealthResponse,
    RootResponse,
    RoutingTestResponse,
    WebhookAccepted,
    WebhookStatusResponse,
};
