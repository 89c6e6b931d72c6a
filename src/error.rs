// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::TokenError;
use crate::database::models::ValidationError;
use crate::database::DatabaseError;
use crate::media::MediaError;

/// HTTP API error with the status code and message the client sees
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    InvalidCredential(String),
    Validation(String),

    // 401 Unauthorized
    MissingCredential(String),

    // 413 Payload Too Large
    PayloadTooLarge(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error (store or media backend)
    Storage(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredential(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingCredential(_) => StatusCode::UNAUTHORIZED,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::InvalidCredential(msg)
            | ApiError::Validation(msg)
            | ApiError::MissingCredential(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Storage(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({ "message": self.message() })
    }
}

// Static constructor methods
impl ApiError {
    pub fn missing_credential() -> Self {
        ApiError::MissingCredential("Access denied. No token provided.".to_string())
    }

    pub fn invalid_credential() -> Self {
        ApiError::InvalidCredential("Invalid token".to_string())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn payload_too_large() -> Self {
        ApiError::PayloadTooLarge("Request body too large".to_string())
    }

    /// Body extraction failure: 413 when the size limit tripped, 400 otherwise
    pub fn body_rejection(status: StatusCode, message: impl Into<String>) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::payload_too_large()
        } else {
            ApiError::validation(message)
        }
    }

    pub fn forbidden() -> Self {
        ApiError::Forbidden("Unauthorized".to_string())
    }

    pub fn item_not_found() -> Self {
        ApiError::NotFound("Item not found".to_string())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        ApiError::Storage(message.into())
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Missing => ApiError::missing_credential(),
            TokenError::Invalid(reason) => {
                tracing::debug!("Rejected credential: {}", reason);
                ApiError::invalid_credential()
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        tracing::error!("Item store error: {}", err);
        ApiError::storage(err.to_string())
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::UnsupportedFormat(_) => ApiError::validation(err.to_string()),
            MediaError::Backend(_) => {
                tracing::error!("Media backend error: {}", err);
                ApiError::storage(err.to_string())
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
