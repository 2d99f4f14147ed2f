//! Shared request state

use crate::config::Settings;
use crate::error::Result;
use crate::sink::{self, SignalSink};
use std::sync::Arc;

/// State shared by every handler
pub struct AppState {
    pub settings: Arc<Settings>,
    /// Consumer of accepted signals
    pub sink: Arc<dyn SignalSink>,
}

impl AppState {
    /// Build state with the sink the settings call for
    pub fn new(settings: Settings) -> Result<Self> {
        let sink = sink::from_settings(&settings)?;
        Ok(Self::with_sink(settings, sink))
    }

    pub fn with_sink(settings: Settings, sink: Arc<dyn SignalSink>) -> Self {
        Self {
            settings: Arc::new(settings),
            sink,
        }
    }
}
