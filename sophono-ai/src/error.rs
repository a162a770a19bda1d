//! Error types for sophono-ai
//!
//! Two layers:
//! - [`AnalysisError`]: failures of one pipeline invocation. These are caught at
//!   the invocation boundary and turned into an error-status
//!   [`AnalysisResponse`](sophono_common::api::AnalysisResponse).
//! - [`ApiError`]: malformed HTTP requests, rendered as JSON error bodies.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::text_generator::LlmError;

/// Pipeline failure taxonomy
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Unreadable file or unsupported container/codec
    #[error("Decode error: {0}")]
    Decode(String),

    /// Zero-length or silent audio
    #[error("Empty signal: {0}")]
    EmptySignal(String),

    /// Blank lyrics; raised before any collaborator call
    #[error("No lyrics provided")]
    EmptyInput,

    /// Text-generation collaborator failed
    #[error("Error generating final analysis: {0}")]
    Collaborator(#[from] LlmError),

    /// Background task failure (panic or cancellation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Upload exceeds the configured body limit (413)
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
