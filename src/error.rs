//! Application error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::signal::FieldError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Missing X-Webhook-Signature header")]
    MissingSignature,

    #[error("Webhook signature does not match payload")]
    InvalidSignature,

    #[error("Downstream delivery failed: {0}")]
    Delivery(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Serializable error envelope returned to HTTP callers
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error_type: error_type.to_string(),
            message: message.into(),
            errors: None,
        }
    }
}

impl AppError {
    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            AppError::MissingSignature | AppError::InvalidSignature => StatusCode::UNAUTHORIZED,
            AppError::Delivery(_)
            | AppError::Http(_)
            | AppError::Config(_)
            | AppError::Io(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::MalformedBody(_) => "malformed_body",
            AppError::MissingSignature => "missing_signature",
            AppError::InvalidSignature => "invalid_signature",
            _ => "internal_error",
        }
    }
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        match err {
            AppError::Validation(errors) => ErrorResponse {
                errors: Some(errors.clone()),
                ..ErrorResponse::new(err.error_type(), "Signal validation failed")
            },
            AppError::MalformedBody(_) | AppError::MissingSignature | AppError::InvalidSignature => {
                ErrorResponse::new(err.error_type(), err.to_string())
            }
            // Internal details stay in the logs
            _ => ErrorResponse::new(err.error_type(), "Internal server error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_422_with_fields() {
        let err = AppError::Validation(vec![FieldError::new("price", "must be greater than 0")]);
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = ErrorResponse::from(&err);
        assert_eq!(body.error_type, "validation_error");
        let errors = body.errors.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "price");
    }

    #[test]
    fn test_internal_errors_hide_detail() {
        let err = AppError::Delivery("connection refused to 10.0.0.7".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = ErrorResponse::from(&err);
        assert_eq!(body.message, "Internal server error");
        assert!(body.errors.is_none());
    }

    #[test]
    fn test_signature_errors_are_unauthorized() {
        assert_eq!(AppError::MissingSignature.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ErrorResponse::from(&AppError::InvalidSignature).error_type,
            "invalid_signature"
        );
    }
}
