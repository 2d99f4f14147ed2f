//! TradingView signal payload
//!
//! Alerts arrive as loosely-typed JSON. TradingView substitutes placeholders
//! such as `{{close}}` into string positions, and other charting tools use
//! different field names, so parsing is lenient about *shape* but strict
//! about the invariants: non-empty `symbol`/`action`, positive finite
//! `price`/`quantity`.
//!
//! Fields are read in two passes. `SignalFields` captures each field as raw
//! JSON so one bad value cannot hide the others; `TradingSignal` then types
//! them and runs the `validator` rules, and every offending field is
//! reported together.

use crate::error::{AppError, Result};
use serde::{de::IgnoredAny, Deserialize, Serialize};
use serde_json::value::RawValue;
use validator::{Validate, ValidationError};

/// Canonical field order for error reports
const FIELD_ORDER: &[&str] = &["symbol", "action", "price", "quantity", "message"];

/// Raw alert fields as sent.
///
/// Aliases are kept as separate fields so the canonical name wins when both
/// are present. JSON `null` counts as absent.
#[derive(Debug, Default, Deserialize)]
pub struct SignalFields {
    symbol: Option<Box<RawValue>>,
    ticker: Option<Box<RawValue>>,
    action: Option<Box<RawValue>>,
    side: Option<Box<RawValue>>,
    order: Option<Box<RawValue>>,
    price: Option<Box<RawValue>>,
    quantity: Option<Box<RawValue>>,
    qty: Option<Box<RawValue>>,
    message: Option<Box<RawValue>>,
}

/// A validated webhook payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TradingSignal {
    #[validate(
        length(min = 1, message = "must not be empty"),
        custom(function = "validate_not_blank")
    )]
    pub symbol: String,
    #[validate(
        length(min = 1, message = "must not be empty"),
        custom(function = "validate_not_blank")
    )]
    pub action: String,
    #[validate(range(exclusive_min = 0.0, message = "must be greater than 0"))]
    pub price: f64,
    #[validate(range(exclusive_min = 0.0, message = "must be greater than 0"))]
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One offending field in a rejected payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Direction derived from the free-form `action`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSide {
    Buy,
    Sell,
    Close,
    Other,
}

impl SignalSide {
    pub fn from_action(action: &str) -> Self {
        match action.trim().to_lowercase().as_str() {
            "buy" | "long" => SignalSide::Buy,
            "sell" | "short" => SignalSide::Sell,
            "close" | "exit" | "flat" => SignalSide::Close,
            _ => SignalSide::Other,
        }
    }
}

impl TradingSignal {
    /// Parse a raw request body into its alert fields
    pub fn parse_body(body: &[u8]) -> Result<SignalFields> {
        match body.iter().find(|b| !b.is_ascii_whitespace()) {
            None => Err(AppError::MalformedBody("request body is empty".to_string())),
            Some(b'{') => serde_json::from_slice(body)
                .map_err(|e| AppError::MalformedBody(format!("invalid JSON: {}", e))),
            Some(_) => match serde_json::from_slice::<IgnoredAny>(body) {
                Ok(_) => Err(AppError::MalformedBody("expected a JSON object".to_string())),
                Err(e) => Err(AppError::MalformedBody(format!("invalid JSON: {}", e))),
            },
        }
    }

    /// Type and validate alert fields, collecting every offending field
    pub fn from_fields(fields: SignalFields) -> Result<Self> {
        let mut errors = Vec::new();

        let symbol = required(&mut errors, "symbol", fields.symbol.or(fields.ticker), text);
        let action = required(
            &mut errors,
            "action",
            fields.action.or(fields.side).or(fields.order),
            text,
        );
        let price = required(&mut errors, "price", fields.price, flexible_f64);
        let quantity = required(
            &mut errors,
            "quantity",
            fields.quantity.or(fields.qty),
            flexible_f64,
        );
        let message = fields
            .message
            .and_then(|raw| text(&raw).map_err(|m| errors.push(FieldError::new("message", m))).ok());

        let signal = Self {
            symbol: symbol.unwrap_or_default(),
            action: action.unwrap_or_default(),
            price: price.unwrap_or_default(),
            quantity: quantity.unwrap_or_default(),
            message,
        };

        if let Err(report) = signal.validate() {
            for (field, failures) in report.field_errors() {
                // A field that failed typing already carries its error
                if errors.iter().any(|e| e.field.as_str() == &*field) {
                    continue;
                }
                if let Some(failure) = failures.first() {
                    let message = failure.message.as_deref().unwrap_or("is invalid");
                    errors.push(FieldError::new(&field, message));
                }
            }
        }

        if errors.is_empty() {
            Ok(signal)
        } else {
            errors.sort_by_key(|e| {
                FIELD_ORDER
                    .iter()
                    .position(|f| *f == e.field)
                    .unwrap_or(FIELD_ORDER.len())
            });
            Err(AppError::Validation(errors))
        }
    }

    pub fn side(&self) -> SignalSide {
        SignalSide::from_action(&self.action)
    }
}

fn validate_not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("must not be empty".into());
        return Err(error);
    }
    Ok(())
}

/// Type one present field, or record it as missing
fn required<T>(
    errors: &mut Vec<FieldError>,
    field: &str,
    raw: Option<Box<RawValue>>,
    convert: fn(&RawValue) -> std::result::Result<T, String>,
) -> Option<T> {
    let Some(raw) = raw else {
        errors.push(FieldError::new(field, "field required"));
        return None;
    };
    convert(&raw)
        .map_err(|message| errors.push(FieldError::new(field, message)))
        .ok()
}

fn text(raw: &RawValue) -> std::result::Result<String, String> {
    serde_json::from_str(raw.get()).map_err(|_| format!("must be a string, got {}", raw.get()))
}

/// Accept a JSON number or a string holding one.
///
/// Numbers are read from their literal text, so `1e400` becomes infinity
/// and is reported against its field instead of failing the whole body.
fn flexible_f64(raw: &RawValue) -> std::result::Result<f64, String> {
    let literal = serde_json::from_str::<String>(raw.get()).unwrap_or_else(|_| raw.get().to_string());
    let number: f64 = literal
        .trim()
        .parse()
        .map_err(|_| format!("must be a number, got {}", raw.get()))?;

    if number.is_finite() {
        Ok(number)
    } else {
        Err("must be a finite number".to_string())
    }
}
