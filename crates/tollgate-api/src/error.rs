//! API error handling
//!
//! Maps the session error taxonomy onto HTTP responses. Messages are fixed
//! per class; internal details are logged and never returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tollgate_core::TollgateError;
use utoipa::ToSchema;

use crate::validation::ValidationFailure;

pub const MSG_UNAUTHENTICATED: &str = "not authorized";
pub const MSG_ALREADY_EXISTS: &str = "user auth already exist";
pub const MSG_USER_NOT_FOUND: &str = "User not found";
pub const MSG_REFRESH_NOT_FOUND: &str = "refresh token not found";
pub const MSG_CONFLICT: &str = "session was refreshed concurrently";
pub const MSG_INTERNAL: &str = "try it a little later or check the data you entered";

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn unauthorized() -> Self {
        Self::new("UNAUTHENTICATED", MSG_UNAUTHENTICATED)
    }

    pub fn internal_error() -> Self {
        Self::new("INTERNAL_ERROR", MSG_INTERNAL)
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Malformed request or identifier
    BadRequest(String),
    /// Password rejected by policy, with the user-facing reason
    PolicyViolation(String),
    Unauthorized,
    AlreadyExists,
    /// Missing identity or session, with the fixed message for the operation
    NotFound(&'static str),
    Conflict,
    /// Logged, then replaced by a generic message
    Internal(String),
    /// Store not reachable
    Unavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiError::bad_request(msg)),
            AppError::PolicyViolation(reason) => (
                StatusCode::BAD_REQUEST,
                ApiError::new("POLICY_VIOLATION", reason),
            ),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, ApiError::unauthorized()),
            AppError::AlreadyExists => (
                StatusCode::CONFLICT,
                ApiError::new("ALREADY_EXISTS", MSG_ALREADY_EXISTS),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::Conflict => (
                StatusCode::CONFLICT,
                ApiError::new("CONFLICT", MSG_CONFLICT),
            ),
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed with internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, ApiError::internal_error())
            }
            AppError::Unavailable(detail) => {
                tracing::warn!(error = %detail, "Backend unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ApiError::new("UNAVAILABLE", "service not ready"),
                )
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<ValidationFailure> for AppError {
    fn from(failure: ValidationFailure) -> Self {
        AppError::BadRequest(failure.to_string())
    }
}

impl From<TollgateError> for AppError {
    fn from(err: TollgateError) -> Self {
        match err {
            TollgateError::PolicyViolation(reason) => AppError::PolicyViolation(reason),
            TollgateError::AlreadyExists => AppError::AlreadyExists,
            TollgateError::NotFound => AppError::NotFound(MSG_USER_NOT_FOUND),
            TollgateError::Unauthenticated => AppError::Unauthorized,
            TollgateError::Conflict => AppError::Conflict,
            TollgateError::Internal(detail) => AppError::Internal(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::PolicyViolation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::AlreadyExists, StatusCode::CONFLICT),
            (AppError::NotFound(MSG_USER_NOT_FOUND), StatusCode::NOT_FOUND),
            (AppError::Conflict, StatusCode::CONFLICT),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Unavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_taxonomy_mapping() {
        assert!(matches!(
            AppError::from(TollgateError::Unauthenticated),
            AppError::Unauthorized
        ));
        assert!(matches!(
            AppError::from(TollgateError::PolicyViolation("weak".into())),
            AppError::PolicyViolation(reason) if reason == "weak"
        ));
        assert!(matches!(
            AppError::from(TollgateError::Internal("db down".into())),
            AppError::Internal(_)
        ));
    }
}
