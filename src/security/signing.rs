//! HMAC-SHA256 webhook signatures
//!
//! TradingView itself cannot sign alerts, so signing is opt-in: a relay in
//! front of this service (or a test harness) computes
//! `hex(hmac_sha256(WEBHOOK_SECRET, raw_body))` and sends it as
//! `X-Webhook-Signature`.

use crate::error::{AppError, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

fn mac_for(secret: &str) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("Invalid HMAC key: {}", e)))
}

/// Sign a payload and return the lowercase hex signature
pub fn sign_payload(secret: &str, payload: &[u8]) -> Result<String> {
    let mut mac = mac_for(secret)?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check a hex signature against a payload in constant time
pub fn verify_signature(secret: &str, payload: &[u8], signature: &str) -> Result<bool> {
    let provided = match hex::decode(signature.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return Ok(false),
    };
    let mut mac = mac_for(secret)?;
    mac.update(payload);
    Ok(mac.verify_slice(&provided).is_ok())
}

/// Enforce the signature policy for one request.
///
/// No secret configured means every request passes. A header that is
/// present but not valid text is a bad signature, not a missing one.
pub fn check_request(secret: Option<&str>, payload: &[u8], header: Option<&[u8]>) -> Result<()> {
    let Some(secret) = secret else {
        return Ok(());
    };
    let header = header.ok_or(AppError::MissingSignature)?;
    let signature = std::str::from_utf8(header).map_err(|_| AppError::InvalidSignature)?;
    if verify_signature(secret, payload, signature)? {
        Ok(())
    } else {
        Err(AppError::InvalidSignature)
    }
}
