//! Downstream delivery of accepted signals
//!
//! The webhook handler hands every accepted signal to exactly one
//! `SignalSink`. Which sink is used is decided once at startup from
//! `FORWARD_URL`.

mod http;

use crate::assessment::SignalAssessment;
use crate::config::Settings;
use crate::error::Result;
use crate::signal::{SignalSide, TradingSignal};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

pub use http::HttpForwardSink;

/// A validated signal plus everything derived from it on receipt
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedSignal {
    pub id: uuid::Uuid,
    pub received_at: chrono::DateTime<chrono::Utc>,
    pub signal: TradingSignal,
    pub side: SignalSide,
    pub assessment: SignalAssessment,
}

impl AcceptedSignal {
    pub fn new(signal: TradingSignal, assessment: SignalAssessment) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            received_at: chrono::Utc::now(),
            side: signal.side(),
            signal,
            assessment,
        }
    }
}

/// Consumer of accepted signals
#[async_trait]
pub trait SignalSink: Send + Sync {
    /// Short identifier reported by the status endpoint
    fn name(&self) -> &'static str;

    /// Deliver one signal. An error fails the originating request.
    async fn deliver(&self, accepted: &AcceptedSignal) -> Result<()>;
}

/// Default sink: records the signal in the service log
pub struct LogSink;

#[async_trait]
impl SignalSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, accepted: &AcceptedSignal) -> Result<()> {
        info!(
            "Signal {} accepted: {} {} {} @ {} (score {}/10, {:?})",
            accepted.id,
            accepted.signal.action,
            accepted.signal.quantity,
            accepted.signal.symbol,
            accepted.signal.price,
            accepted.assessment.score,
            accepted.assessment.grade,
        );
        Ok(())
    }
}

/// Pick the sink for the configured settings
pub fn from_settings(settings: &Settings) -> Result<Arc<dyn SignalSink>> {
    match &settings.forward_url {
        Some(url) => {
            info!("Forwarding accepted signals to {}", url);
            Ok(Arc::new(HttpForwardSink::new(url, settings.forward_timeout)?))
        }
        None => Ok(Arc::new(LogSink)),
    }
}
