//! Service configuration
//!
//! Loaded from environment variables. `main` calls `dotenvy::dotenv()` first,
//! so a `.env` file in the working directory is honoured.

use crate::error::{AppError, Result};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

pub const SERVICE_NAME: &str = "Amoeba Trading System";
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Runtime settings for the webhook receiver
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Default level for this crate when `RUST_LOG` is not set
    pub log_level: String,
    /// "development", "staging", "production", ...
    pub environment: String,
    /// Shared secret for X-Webhook-Signature; `None` disables verification
    pub webhook_secret: Option<String>,
    /// Downstream endpoint that receives accepted signals
    pub forward_url: Option<String>,
    pub forward_timeout: Duration,
    /// Requests per second on the TradingView endpoint (0 = unlimited)
    pub webhook_rate_limit: u32,
    /// Requests per second on everything else (0 = unlimited)
    pub api_rate_limit: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            log_level: "info".to_string(),
            environment: "development".to_string(),
            webhook_secret: None,
            forward_url: None,
            forward_timeout: Duration::from_secs(10),
            webhook_rate_limit: 10,
            api_rate_limit: 100,
        }
    }
}

impl Settings {
    /// Load settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Build settings from an explicit variable map
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let defaults = Self::default();
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_var(&vars, "PORT")?.unwrap_or(defaults.port),
            log_level: get("LOG_LEVEL")
                .map(|l| l.to_lowercase())
                .unwrap_or(defaults.log_level),
            environment: get("ENVIRONMENT")
                .map(|e| e.to_lowercase())
                .unwrap_or(defaults.environment),
            webhook_secret: get("WEBHOOK_SECRET"),
            forward_url: get("FORWARD_URL"),
            forward_timeout: parse_var::<u64>(&vars, "FORWARD_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.forward_timeout),
            webhook_rate_limit: parse_var(&vars, "WEBHOOK_RATE_LIMIT")?
                .unwrap_or(defaults.webhook_rate_limit),
            api_rate_limit: parse_var(&vars, "API_RATE_LIMIT")?.unwrap_or(defaults.api_rate_limit),
        })
    }

    /// Address the server binds to
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid address {}:{}: {}", self.host, self.port, e)))
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn webhook_secret_configured(&self) -> bool {
        self.webhook_secret.is_some()
    }
}

fn parse_var<T>(vars: &HashMap<String, String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| AppError::Config(format!("{} has invalid value '{}': {}", key, raw, e))),
        None => Ok(None),
    }
}
