//! API error type mapped onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use embedgate_model::ModelError;
use embedgate_secrets::SecretError;

/// Result type for request handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors surfaced by the HTTP layer.
///
/// Every variant renders as a `{"detail": "..."}` JSON body; only the status
/// code varies. Malformed or out-of-bounds request bodies are client errors,
/// anything that fails after validation is a server error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request body failed validation.
    #[error("{0}")]
    Validation(String),

    /// Model loading or encoding failed.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Key resolution or payload decryption/encryption failed.
    #[error(transparent)]
    Secret(#[from] SecretError),

    /// Encoding exceeded the per-request timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),
}

impl ApiError {
    /// HTTP status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Model(_) | ApiError::Secret(_) | ApiError::Timeout(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({ "detail": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
