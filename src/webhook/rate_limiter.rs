//! Rate limiting middleware
//!
//! Token bucket per endpoint category:
//! - Webhook: POST /api/v1/webhooks/tradingview (WEBHOOK_RATE_LIMIT, default 10/s)
//! - General: everything else (API_RATE_LIMIT, default 100/s)
//!
//! A rate of 0 leaves that category unlimited.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Rate limit type for different endpoint categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitType {
    /// Status, health and other read-only calls
    General,
    /// Inbound alerts
    Webhook,
}

impl RateLimitType {
    fn label(self) -> &'static str {
        match self {
            RateLimitType::General => "general",
            RateLimitType::Webhook => "webhook",
        }
    }
}

/// Token bucket refilled continuously at `rate` tokens per second
#[derive(Debug)]
struct TokenBucket {
    rate: f64,
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(rate_per_second: u32, now: Instant) -> Self {
        let rate = f64::from(rate_per_second);
        Self {
            rate,
            tokens: rate,
            last_refill: now,
        }
    }

    /// Take one token, or report how long until one is available
    fn take(&mut self, now: Instant) -> Result<(), Duration> {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.rate).min(self.rate);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            Err(Duration::from_secs_f64((1.0 - self.tokens) / self.rate))
        }
    }
}

/// Shared rate limiter state
#[derive(Debug)]
pub struct RateLimiterState {
    buckets: Mutex<HashMap<RateLimitType, TokenBucket>>,
}

impl RateLimiterState {
    pub fn new(api_rate: u32, webhook_rate: u32) -> Self {
        let now = Instant::now();
        let buckets = [
            (RateLimitType::General, api_rate),
            (RateLimitType::Webhook, webhook_rate),
        ]
        .into_iter()
        .filter(|(_, rate)| *rate > 0)
        .map(|(rate_type, rate)| (rate_type, TokenBucket::new(rate, now)))
        .collect();

        Self {
            buckets: Mutex::new(buckets),
        }
    }

    /// Try to acquire a token; Err carries the wait until one is available
    pub fn try_acquire(&self, rate_type: RateLimitType) -> Result<(), Duration> {
        self.try_acquire_at(rate_type, Instant::now())
    }

    fn try_acquire_at(&self, rate_type: RateLimitType, now: Instant) -> Result<(), Duration> {
        match self.buckets.lock().get_mut(&rate_type) {
            Some(bucket) => bucket.take(now),
            // No bucket means the category is unlimited
            None => Ok(()),
        }
    }
}

/// Determine rate limit type based on request path
pub fn get_rate_limit_type(path: &str) -> RateLimitType {
    if path.starts_with("/api/v1/webhooks/tradingview") {
        RateLimitType::Webhook
    } else {
        RateLimitType::General
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(state): State<Arc<RateLimiterState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let rate_type = get_rate_limit_type(request.uri().path());

    if let Err(wait_time) = state.try_acquire(rate_type) {
        tracing::warn!(
            "Rate limit exceeded for {:?}, path: {}, retry after {}ms",
            rate_type,
            request.uri().path(),
            wait_time.as_millis()
        );
        return rate_limit_response(wait_time, rate_type);
    }

    next.run(request).await
}

/// Create a rate limit exceeded response
fn rate_limit_response(retry_after: Duration, rate_type: RateLimitType) -> Response {
    let retry_seconds = retry_after.as_secs_f64().ceil().max(1.0) as u64;

    let body = Json(json!({
        "status": "error",
        "error_type": "rate_limit_exceeded",
        "message": format!(
            "Rate limit exceeded for {}. Please retry after {} seconds.",
            rate_type.label(),
            retry_seconds
        ),
        "retry_after_ms": retry_after.as_millis() as u64
    }));

    let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
    let headers = response.headers_mut();
    headers.insert("Retry-After", HeaderValue::from(retry_seconds));
    headers.insert("X-RateLimit-Type", HeaderValue::from_static(rate_type.label()));

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_burst_then_reject() {
        let state = RateLimiterState::new(100, 3);
        let now = Instant::now();

        for _ in 0..3 {
            assert!(state.try_acquire_at(RateLimitType::Webhook, now).is_ok());
        }
        let wait = state.try_acquire_at(RateLimitType::Webhook, now).unwrap_err();
        // One token at 3/s
        assert!(wait > Duration::from_millis(300) && wait <= Duration::from_millis(334));
    }

    #[test]
    fn test_webhook_refills_over_time() {
        let state = RateLimiterState::new(100, 10);
        let start = Instant::now();

        for _ in 0..10 {
            assert!(state.try_acquire_at(RateLimitType::Webhook, start).is_ok());
        }
        assert!(state.try_acquire_at(RateLimitType::Webhook, start).is_err());

        // 10/s for 300ms earns three alerts, no more
        let later = start + Duration::from_millis(300);
        for _ in 0..3 {
            assert!(state.try_acquire_at(RateLimitType::Webhook, later).is_ok());
        }
        assert!(state.try_acquire_at(RateLimitType::Webhook, later).is_err());
    }

    #[test]
    fn test_idle_bucket_never_exceeds_rate() {
        let state = RateLimiterState::new(2, 10);
        let later = Instant::now() + Duration::from_secs(60);

        assert!(state.try_acquire_at(RateLimitType::General, later).is_ok());
        assert!(state.try_acquire_at(RateLimitType::General, later).is_ok());
        assert!(state.try_acquire_at(RateLimitType::General, later).is_err());
    }

    #[test]
    fn test_rate_limit_type_detection() {
        assert_eq!(get_rate_limit_type("/api/v1/webhooks/tradingview"), RateLimitType::Webhook);
        assert_eq!(get_rate_limit_type("/api/v1/webhooks/status"), RateLimitType::General);
        assert_eq!(get_rate_limit_type("/health"), RateLimitType::General);
    }

    #[test]
    fn test_categories_are_independent() {
        let state = RateLimiterState::new(100, 1);

        assert!(state.try_acquire(RateLimitType::Webhook).is_ok());
        let wait = state.try_acquire(RateLimitType::Webhook).unwrap_err();
        assert!(wait <= Duration::from_secs(1));

        assert!(state.try_acquire(RateLimitType::General).is_ok());
    }

    #[test]
    fn test_zero_rate_is_unlimited() {
        let state = RateLimiterState::new(0, 0);
        for _ in 0..1000 {
            assert!(state.try_acquire(RateLimitType::Webhook).is_ok());
        }
    }
}
