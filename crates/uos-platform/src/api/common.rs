//! Common API types and utilities

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::error::PlatformError;

/// Standard API error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// Build a 400 response with an explicit error code and message.
pub fn bad_request(error: &str, message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(ApiError::new(error, message))).into_response()
}

impl PlatformError {
    /// Stable machine-readable code for the API error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            PlatformError::NotFound { .. } => "NOT_FOUND",
            PlatformError::Duplicate { .. } => "DUPLICATE",
            PlatformError::Validation { .. } => "VALIDATION",
            PlatformError::InvalidPaymentState { .. } => "INVALID_PAYMENT_STATE",
            PlatformError::InvalidTransition { .. } => "INVALID_TRANSITION",
            PlatformError::SequenceExhausted { .. } => "SEQUENCE_EXHAUSTED",
            PlatformError::InvalidMatricule(_) => "INVALID_MATRICULE",
            PlatformError::Database(_) => "DATABASE",
            PlatformError::Hash(_) => "HASH",
            PlatformError::Json(_) => "JSON",
            PlatformError::Internal { .. } => "INTERNAL",
        }
    }
}

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        let status = match &self {
            PlatformError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ if self.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Validation messages are written for callers; other internals stay
        // behind the generic Display text.
        let message = match &self {
            PlatformError::Validation { message } => message.clone(),
            _ => self.to_string(),
        };

        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        (status, Json(ApiError::new(self.code(), message))).into_response()
    }
}
