//! Forwards accepted signals to an HTTP endpoint as JSON

use super::{AcceptedSignal, SignalSink};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

pub struct HttpForwardSink {
    client: reqwest::Client,
    url: String,
}

impl HttpForwardSink {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl SignalSink for HttpForwardSink {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn deliver(&self, accepted: &AcceptedSignal) -> Result<()> {
        let response = self.client.post(&self.url).json(accepted).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Forward of signal {} rejected with {}: {}", accepted.id, status, body);
            return Err(AppError::Delivery(format!("{} returned {}", self.url, status)));
        }

        debug!("Signal {} forwarded to {}", accepted.id, self.url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::{assess, AlertContext};
    use crate::signal::TradingSignal;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use tokio::sync::mpsc;

    fn accepted() -> AcceptedSignal {
        let signal = TradingSignal {
            symbol: "ETHUSD".to_string(),
            action: "buy".to_string(),
            price: 3000.0,
            quantity: 2.0,
            message: Some("breakout".to_string()),
        };
        AcceptedSignal::new(signal, assess(&AlertContext::default()))
    }

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/signals", addr)
    }

    #[tokio::test]
    async fn test_forwards_json_body() {
        let (tx, mut rx) = mpsc::unbounded_channel::<serde_json::Value>();
        let app = Router::new().route(
            "/signals",
            post(move |Json(body): Json<serde_json::Value>| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(body);
                    StatusCode::OK
                }
            }),
        );
        let url = spawn(app).await;

        let sink = HttpForwardSink::new(&url, Duration::from_secs(5)).unwrap();
        let signal = accepted();
        sink.deliver(&signal).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received["id"], signal.id.to_string());
        assert_eq!(received["signal"]["symbol"], "ETHUSD");
        assert_eq!(received["signal"]["quantity"], 2.0);
        assert_eq!(received["side"], "buy");
    }

    #[tokio::test]
    async fn test_non_success_status_is_delivery_error() {
        let app = Router::new().route("/signals", post(|| async { StatusCode::SERVICE_UNAVAILABLE }));
        let url = spawn(app).await;

        let sink = HttpForwardSink::new(&url, Duration::from_secs(5)).unwrap();
        let err = sink.deliver(&accepted()).await.unwrap_err();
        assert!(matches!(err, AppError::Delivery(_)));
    }
}
