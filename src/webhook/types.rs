//! Response bodies for the webhook server

use crate::assessment::SignalAssessment;
use crate::signal::{SignalSide, TradingSignal};
use crate::sink::AcceptedSignal;
use serde::Serialize;
use std::collections::BTreeMap;

/// GET /
#[derive(Debug, Clone, Serialize)]
pub struct RootResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub environment: String,
    pub endpoints: EndpointMap,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointMap {
    pub health: &'static str,
    pub webhook: &'static str,
    pub status: &'static str,
}

/// GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub version: &'static str,
    pub environment: String,
}

/// GET /api/v1/webhooks/status
#[derive(Debug, Clone, Serialize)]
pub struct WebhookStatusResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub webhook_secret_configured: bool,
    pub forwarding: &'static str,
}

/// GET /api/v1/webhooks/test
#[derive(Debug, Clone, Serialize)]
pub struct RoutingTestResponse {
    pub message: &'static str,
    pub endpoint: &'static str,
    pub status: &'static str,
}

/// POST /api/v1/webhooks/tradingview (success)
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAccepted {
    pub status: &'static str,
    pub message: String,
    pub signal_id: String,
    pub received_at: String,
    pub signal: TradingSignal,
    pub side: SignalSide,
    pub assessment: SignalAssessment,
}

impl From<AcceptedSignal> for WebhookAccepted {
    fn from(accepted: AcceptedSignal) -> Self {
        Self {
            status: "success",
            message: format!(
                "Signal accepted: {} {}",
                accepted.signal.action, accepted.signal.symbol
            ),
            signal_id: accepted.id.to_string(),
            received_at: accepted.received_at.to_rfc3339(),
            signal: accepted.signal,
            side: accepted.side,
            assessment: accepted.assessment,
        }
    }
}

/// POST /api/v1/webhooks/debug
#[derive(Debug, Clone, Serialize)]
pub struct DebugEcho {
    pub method: String,
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub raw_body: Option<String>,
    pub parsed_body: Option<serde_json::Value>,
    pub content_type: Option<String>,
    pub content_length: usize,
}
