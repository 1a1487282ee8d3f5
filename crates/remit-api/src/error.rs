//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

use remit_auth::TokenError;
use remit_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Optional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Handler error: an [`AppError`] plus optional structured details.
#[derive(Debug)]
pub struct ApiError {
    pub error: AppError,
    pub details: Option<serde_json::Value>,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        status_for(self.error.kind)
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self {
            error,
            details: None,
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        AppError::from(err).into()
    }
}

/// Reject a request body that failed its `Validate` rules.
pub fn invalid_body(errors: ValidationErrors) -> ApiError {
    ApiError {
        error: AppError::validation("Request validation failed"),
        details: serde_json::to_value(errors.field_errors()).ok(),
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidCredential | ErrorKind::TokenInvalid => StatusCode::UNAUTHORIZED,
        ErrorKind::AccountLocked | ErrorKind::AccountInactive | ErrorKind::Forbidden => {
            StatusCode::FORBIDDEN
        }
        ErrorKind::Validation | ErrorKind::Expired => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal
        | ErrorKind::Database
        | ErrorKind::Cache
        | ErrorKind::Configuration
        | ErrorKind::Serialization => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status == StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(error = ?self.error, "Backing service unavailable");
            "Service temporarily unavailable".to_string()
        } else if status.is_server_error() {
            tracing::error!(error = ?self.error, "Internal server error");
            "An internal error occurred".to_string()
        } else {
            self.error.message
        };

        let body = ApiErrorResponse {
            error: self.error.kind.to_string(),
            message,
            details: self.details,
        };

        (status, Json(body)).into_response()
    }
}
