//! Amoeba Trading System - webhook receiver
//!
//! Accepts TradingView alert payloads over HTTP, validates them into
//! `TradingSignal`s, scores them and hands them to a downstream sink.

pub mod assessment;
pub mod config;
pub mod error;
pub mod security;
pub mod signal;
pub mod sink;
pub mod state;
pub mod webhook;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use config::Settings;
pub use error::{AppError, Result};
pub use signal::TradingSignal;
pub use state::AppState;
pub use webhook::{build_router, WebhookServer};

/// Initialize tracing/logging.
///
/// `RUST_LOG` wins when set; otherwise `log_level` applies to this crate.
pub fn init_tracing(log_level: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("amoeba_backend={},tower_http=info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
