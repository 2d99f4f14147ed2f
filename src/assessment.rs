//! Alert assessment
//!
//! Scores an accepted alert 0-10 from the optional context fields a Pine
//! script can attach (volume surge, resistance, pressure, ...). The score
//! is informational: it travels with the signal downstream and is echoed
//! back to the caller, but never causes a rejection.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// Optional enrichment fields read from the alert body.
///
/// Values of the wrong JSON type fall back to the default.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertContext {
    pub alert_type: Option<String>,
    pub confidence: f64,
    pub pressure: f64,
    pub threshold: f64,
    pub volume_surge_ratio: f64,
    pub volume_trend_strength: f64,
    pub institutional_hours: bool,
    pub range_expansion: f64,
    pub resistance_level: String,
    pub consistent_advancement: bool,
    pub consistent_decline: bool,
    pub is_weekend_approach: bool,
    pub market_structure: String,
}

impl Default for AlertContext {
    fn default() -> Self {
        Self {
            alert_type: None,
            confidence: 0.5,
            pressure: 1.0,
            threshold: 1.5,
            volume_surge_ratio: 1.0,
            volume_trend_strength: 1.0,
            institutional_hours: false,
            range_expansion: 1.0,
            resistance_level: "NORMAL".to_string(),
            consistent_advancement: false,
            consistent_decline: false,
            is_weekend_approach: false,
            market_structure: "NORMAL".to_string(),
        }
    }
}

/// Context fields as sent; anything unreadable becomes `None`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContextFields {
    #[serde(deserialize_with = "lenient")]
    alert_type: Option<String>,
    #[serde(deserialize_with = "lenient")]
    confidence: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pressure: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    threshold: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    volume_surge_ratio: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    volume_trend_strength: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    institutional_hours: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    range_expansion: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    resistance_level: Option<String>,
    #[serde(deserialize_with = "lenient")]
    consistent_advancement: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    consistent_decline: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    is_weekend_approach: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    market_structure: Option<String>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Box::<RawValue>::deserialize(deserializer)?;
    Ok(serde_json::from_str(raw.get()).ok())
}

impl AlertContext {
    /// Read the context from a JSON object body; unreadable bodies give defaults
    pub fn from_slice(body: &[u8]) -> Self {
        let fields: ContextFields = serde_json::from_slice(body).unwrap_or_default();
        let d = Self::default();

        Self {
            alert_type: fields.alert_type,
            confidence: fields.confidence.unwrap_or(d.confidence),
            pressure: fields.pressure.unwrap_or(d.pressure),
            threshold: fields.threshold.unwrap_or(d.threshold),
            volume_surge_ratio: fields.volume_surge_ratio.unwrap_or(d.volume_surge_ratio),
            volume_trend_strength: fields.volume_trend_strength.unwrap_or(d.volume_trend_strength),
            institutional_hours: fields.institutional_hours.unwrap_or_default(),
            range_expansion: fields.range_expansion.unwrap_or(d.range_expansion),
            resistance_level: fields.resistance_level.unwrap_or(d.resistance_level),
            consistent_advancement: fields.consistent_advancement.unwrap_or_default(),
            consistent_decline: fields.consistent_decline.unwrap_or_default(),
            is_weekend_approach: fields.is_weekend_approach.unwrap_or_default(),
            market_structure: fields.market_structure.unwrap_or(d.market_structure),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuantityClass {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityClass {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Grade {
    Limited,
    Moderate,
    Good,
    High,
    Premium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sustainability {
    Limited,
    Moderate,
    Good,
    Excellent,
    Exceptional,
}

/// Result of scoring one alert
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalAssessment {
    /// 0-10, one decimal
    pub score: f64,
    pub grade: Grade,
    pub sustainability: Sustainability,
    pub predicted_duration: &'static str,
    pub quantity: QuantityClass,
    pub quality: QualityClass,
    pub confidence: f64,
    pub factors: Vec<String>,
}

/// Score an alert context
pub fn assess(ctx: &AlertContext) -> SignalAssessment {
    let mut factors = Vec::new();
    let quantity_points = quantity_points(ctx, &mut factors);
    let quality_points = quality_points(ctx, &mut factors);

    let base = f64::from(quantity_points + quality_points) * 10.0 / 11.0;
    let score = (base * modifier(ctx)).clamp(0.0, 10.0);
    let score = (score * 10.0).round() / 10.0;

    let (grade, sustainability, predicted_duration) = band(score);

    SignalAssessment {
        score,
        grade,
        sustainability,
        predicted_duration,
        quantity: match quantity_points {
            0..=1 => QuantityClass::Small,
            2..=3 => QuantityClass::Medium,
            _ => QuantityClass::Large,
        },
        quality: match quality_points {
            0..=1 => QualityClass::Low,
            2..=3 => QualityClass::Medium,
            _ => QualityClass::High,
        },
        confidence: ctx.confidence,
        factors,
    }
}

// 0-5 points
fn quantity_points(ctx: &AlertContext, factors: &mut Vec<String>) -> u32 {
    let mut points = 0;

    if ctx.volume_surge_ratio > 1.5 {
        points += 2;
        factors.push("Strong volume surge (2pts)".to_string());
    } else if ctx.volume_surge_ratio > 1.2 {
        points += 1;
        factors.push("Moderate volume surge (1pt)".to_string());
    }

    if ctx.volume_trend_strength > 1.1 {
        points += 1;
        factors.push("Accelerating volume (1pt)".to_string());
    }

    if ctx.institutional_hours {
        points += 1;
        factors.push("Institutional hours (1pt)".to_string());
    }

    if ctx.range_expansion > 1.2 {
        points += 1;
        factors.push("Range expanding (1pt)".to_string());
    }

    points
}

// 0-6 points
fn quality_points(ctx: &AlertContext, factors: &mut Vec<String>) -> u32 {
    let mut points = 0;

    match ctx.resistance_level.as_str() {
        "LIGHT" => {
            points += 2;
            factors.push("Light resistance (2pts)".to_string());
        }
        "NORMAL" => {
            points += 1;
            factors.push("Normal resistance (1pt)".to_string());
        }
        _ => {}
    }

    if ctx.consistent_advancement || ctx.consistent_decline {
        points += 1;
        factors.push("Directional consistency (1pt)".to_string());
    }

    if ctx.institutional_hours {
        points += 1;
        factors.push("Institutional timing (1pt)".to_string());
    }

    if !ctx.is_weekend_approach {
        points += 1;
        factors.push("Good timing (1pt)".to_string());
    }

    if ctx.market_structure != "CONSTRAINED" {
        points += 1;
        factors.push("Open structure (1pt)".to_string());
    }

    points
}

fn modifier(ctx: &AlertContext) -> f64 {
    let mut m = 1.0;

    if ctx.alert_type.as_deref() == Some("EMERGENCY") {
        m *= 0.7;
    }

    if ctx.confidence > 0.8 {
        m *= 1.1;
    } else if ctx.confidence < 0.4 {
        m *= 0.9;
    }

    if ctx.pressure > ctx.threshold * 1.5 {
        m *= 1.15;
    } else if ctx.pressure > ctx.threshold {
        m *= 1.05;
    }

    m
}

fn band(score: f64) -> (Grade, Sustainability, &'static str) {
    if score >= 9.0 {
        (Grade::Premium, Sustainability::Exceptional, "24-72h")
    } else if score >= 7.0 {
        (Grade::High, Sustainability::Excellent, "12-24h")
    } else if score >= 5.0 {
        (Grade::Good, Sustainability::Good, "6-12h")
    } else if score >= 3.0 {
        (Grade::Moderate, Sustainability::Moderate, "2-6h")
    } else {
        (Grade::Limited, Sustainability::Limited, "30min-2h")
    }
}
