//! HTTP error type with consistent envelope responses.

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use model::Role;
use serde_json::json;
use service::ServiceError;
use tracing::{error, warn};

use crate::schemas::{ErrorResponse, ResponseStatus};

/// Shown for every failed login, whatever the actual cause.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid phone number or password";

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Phone number {phone_number} is already registered as {role}")]
    Conflict { phone_number: String, role: Role },

    #[error("Authentication failed")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Too many requests")]
    TooManyRequests,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::MissingField(field) => ApiError::Validation {
                field: field.to_string(),
                message: format!("{} is required", field),
            },
            ServiceError::InvalidField { field, reason } => ApiError::Validation {
                message: format!("{} {}", field, reason),
                field,
            },
            ServiceError::PhoneTaken { phone_number, role } => {
                ApiError::Conflict { phone_number, role }
            }
            ServiceError::InvalidCredentials => ApiError::Unauthorized,
            ServiceError::AccountNotFound(id) => ApiError::NotFound(format!("Account {} not found", id)),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(error: MultipartError) -> Self {
        ApiError::BadRequest(error.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, outcome, message, details) = match &self {
            ApiError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ResponseStatus::Fail,
                message.clone(),
                Some(json!({ "field": field })),
            ),
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ResponseStatus::Fail, msg.clone(), None)
            }
            ApiError::Conflict { phone_number, role } => (
                StatusCode::CONFLICT,
                ResponseStatus::Fail,
                self.to_string(),
                Some(json!({ "phoneNumber": phone_number, "role": role })),
            ),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ResponseStatus::Fail,
                INVALID_CREDENTIALS_MESSAGE.to_string(),
                None,
            ),
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ResponseStatus::Fail, msg.clone(), None)
            }
            ApiError::TooManyRequests => {
                warn!("Rate limit exceeded");
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    ResponseStatus::Fail,
                    "Too many requests, please try again later".to_string(),
                    None,
                )
            }
            ApiError::Internal(msg) => {
                error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ResponseStatus::Error,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            status: outcome,
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, ApiError>;
