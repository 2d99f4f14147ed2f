//! Webhook endpoint handlers
//!
//! Provides handlers for:
//! - Service acknowledgement and health (/ and /health)
//! - TradingView alerts (/api/v1/webhooks/tradingview)
//! - Webhook subsystem status, routing test and debug echo

use crate::assessment::{assess, AlertContext};
use crate::config::{API_VERSION, SERVICE_NAME};
use crate::error::{ErrorResponse, Result};
use crate::security::signing::{self, SIGNATURE_HEADER};
use crate::signal::TradingSignal;
use crate::sink::AcceptedSignal;
use crate::state::AppState;
use crate::webhook::types::*;
use axum::{
    body::Bytes,
    extract::{Json, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, info};

pub const WEBHOOK_PATH: &str = "/api/v1/webhooks/tradingview";
pub const STATUS_PATH: &str = "/api/v1/webhooks/status";

// ============================================================================
// Service
// ============================================================================

/// Acknowledgement - GET /
pub async fn root(State(state): State<Arc<AppState>>) -> Json<RootResponse> {
    Json(RootResponse {
        name: SERVICE_NAME,
        version: API_VERSION,
        status: "operational",
        environment: state.settings.environment.clone(),
        endpoints: EndpointMap {
            health: "/health",
            webhook: WEBHOOK_PATH,
            status: STATUS_PATH,
        },
    })
}

/// Liveness probe - GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: API_VERSION,
        environment: state.settings.environment.clone(),
    })
}

// ============================================================================
// TradingView Webhook
// ============================================================================

/// Alert intake - POST /api/v1/webhooks/tradingview
///
/// Verifies the signature (when a secret is configured), validates the
/// payload, scores it and hands it to the sink before acknowledging.
pub async fn tradingview_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAccepted>> {
    info!("TradingView webhook received ({} bytes)", body.len());

    let signature = headers.get(SIGNATURE_HEADER).map(|v| v.as_bytes());
    signing::check_request(state.settings.webhook_secret.as_deref(), &body, signature)?;

    let fields = TradingSignal::parse_body(&body)?;
    let signal = TradingSignal::from_fields(fields)?;
    let assessment = assess(&AlertContext::from_slice(&body));

    let accepted = AcceptedSignal::new(signal, assessment);
    state.sink.deliver(&accepted).await?;

    info!(
        "Signal {} accepted for {} via {} sink",
        accepted.id,
        accepted.signal.symbol,
        state.sink.name()
    );

    Ok(Json(WebhookAccepted::from(accepted)))
}

/// Subsystem status - GET /api/v1/webhooks/status
pub async fn webhook_status(State(state): State<Arc<AppState>>) -> Json<WebhookStatusResponse> {
    Json(WebhookStatusResponse {
        status: "active",
        version: API_VERSION,
        webhook_secret_configured: state.settings.webhook_secret_configured(),
        forwarding: state.sink.name(),
    })
}

/// Routing self-check - GET /api/v1/webhooks/test
pub async fn routing_test() -> Json<RoutingTestResponse> {
    Json(RoutingTestResponse {
        message: "Webhook router is working",
        endpoint: WEBHOOK_PATH,
        status: "ready",
    })
}

/// Request inspection - POST /api/v1/webhooks/debug (development only)
pub async fn debug_webhook(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<DebugEcho> {
    debug!("Debug webhook: {} {} ({} bytes)", method, uri, body.len());

    let header_map = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    Json(DebugEcho {
        method: method.to_string(),
        path: uri.path().to_string(),
        headers: header_map,
        raw_body: (!body.is_empty()).then(|| String::from_utf8_lossy(&body).into_owned()),
        parsed_body: serde_json::from_slice(&body).ok(),
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        content_length: body.len(),
    })
}

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(
            "not_found",
            format!("No route for {}", uri.path()),
        )),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::error::AppError;
    use crate::sink::SignalSink;
    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<AcceptedSignal>>,
    }

    #[async_trait]
    impl SignalSink for RecordingSink {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn deliver(&self, accepted: &AcceptedSignal) -> Result<()> {
            self.delivered.lock().push(accepted.clone());
            Ok(())
        }
    }

    fn state_with(settings: Settings) -> (Arc<AppState>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let state = Arc::new(AppState::with_sink(settings, sink.clone()));
        (state, sink)
    }

    #[tokio::test]
    async fn test_accepted_signal_reaches_sink() {
        let (state, sink) = state_with(Settings::default());
        let body = Bytes::from_static(
            br#"{"symbol":"BTCUSD","action":"buy","price":50000.0,"quantity":0.1}"#,
        );

        let Json(response) = tradingview_webhook(State(state), HeaderMap::new(), body)
            .await
            .unwrap();

        assert_eq!(response.status, "success");
        let delivered = sink.delivered.lock();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].id.to_string(), response.signal_id);
        assert_eq!(delivered[0].signal, response.signal);
    }

    #[tokio::test]
    async fn test_rejected_signal_never_reaches_sink() {
        let (state, sink) = state_with(Settings::default());
        let body = Bytes::from_static(br#"{"symbol":"BTCUSD","action":"buy","price":-1,"quantity":0.1}"#);

        let err = tradingview_webhook(State(state), HeaderMap::new(), body)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(sink.delivered.lock().is_empty());
    }

    #[tokio::test]
    async fn test_signature_checked_before_parsing() {
        let settings = Settings {
            webhook_secret: Some("test-secret-key".to_string()),
            ..Settings::default()
        };
        let (state, sink) = state_with(settings);

        let err = tradingview_webhook(State(state), HeaderMap::new(), Bytes::from_static(b"garbage"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MissingSignature));
        assert!(sink.delivered.lock().is_empty());
    }

    #[tokio::test]
    async fn test_non_ascii_signature_is_invalid() {
        let settings = Settings {
            webhook_secret: Some("test-secret-key".to_string()),
            ..Settings::default()
        };
        let (state, sink) = state_with(settings);
        let mut headers = HeaderMap::new();
        headers.insert(
            SIGNATURE_HEADER,
            HeaderValue::from_bytes(&[0xe2, 0x9c, 0x93]).unwrap(),
        );
        let body = Bytes::from_static(br#"{"symbol":"BTCUSD","action":"buy","price":1,"quantity":1}"#);

        let err = tradingview_webhook(State(state), headers, body).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidSignature));
        assert!(sink.delivered.lock().is_empty());
    }

    #[tokio::test]
    async fn test_context_fields_feed_assessment() {
        let (state, sink) = state_with(Settings::default());
        let body = Bytes::from_static(
            br#"{"symbol":"BTCUSD","action":"buy","price":1,"quantity":1,
                 "volume_surge_ratio":2.0,"volume_trend_strength":1.5,
                 "resistance_level":"LIGHT","confidence":0.9}"#,
        );

        let Json(response) = tradingview_webhook(State(state), HeaderMap::new(), body)
            .await
            .unwrap();

        assert_eq!(response.assessment.score, 7.0);
        assert_eq!(sink.delivered.lock()[0].assessment.score, 7.0);
    }

    #[tokio::test]
    async fn test_status_reports_sink_and_secret() {
        let (state, _) = state_with(Settings::default());
        let Json(status) = webhook_status(State(state)).await;
        assert_eq!(status.status, "active");
        assert_eq!(status.forwarding, "recording");
        assert!(!status.webhook_secret_configured);
    }
}
