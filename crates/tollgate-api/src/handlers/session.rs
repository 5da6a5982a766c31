//! Session lifecycle handlers
//!
//! Thin adapters: validate the request, call the coordinator, map the
//! result. No credential or token logic lives here.

use crate::auth::{
    IdentityResponse, LoginRequest, NewSessionRequest, RefreshRequest, RegisterRequest,
    RevokeRequest, RevokeResponse, TokenPairResponse, ValidateRequest, ValidateResponse,
};
use crate::error::{AppError, MSG_REFRESH_NOT_FOUND};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tollgate_core::TollgateError;

/// Register a new identity
///
/// The password must satisfy the policy: 8-30 characters with an uppercase
/// letter, a lowercase letter, a digit and a symbol.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Identity registered", body = IdentityResponse),
        (status = 400, description = "Invalid input or weak password", body = crate::error::ApiError),
        (status = 409, description = "Username taken", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.validator.validate(&request)?;
    state.validator.validate_username(&request.username)?;

    let identity_id = state
        .coordinator
        .register(&request.username, &request.password, &request.email)
        .await?;

    Ok((StatusCode::CREATED, Json(IdentityResponse { identity_id })))
}

/// Log in with username and password
///
/// Replaces any existing session of the identity. Unknown usernames and
/// wrong passwords get the same response.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenPairResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Invalid credentials", body = crate::error::ApiError),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.validator.validate(&request)?;

    let pair = state
        .coordinator
        .login(&request.username, &request.password)
        .await
        .map_err(|e| match e {
            TollgateError::NotFound => AppError::Unauthorized,
            other => AppError::from(other),
        })?;

    Ok(Json(TokenPairResponse::new(pair, state.access_ttl_secs())))
}

/// Validate an access token and return its identity
#[utoipa::path(
    post,
    path = "/api/v1/auth/validate",
    tag = "auth",
    request_body = ValidateRequest,
    responses(
        (status = 200, description = "Token valid", body = ValidateResponse),
        (status = 401, description = "Token invalid, expired or revoked", body = crate::error::ApiError),
    )
)]
pub async fn validate_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ValidateRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.validator.validate(&request)?;

    let identity_id = state.coordinator.validate(&request.access_token).await?;

    Ok(Json(ValidateResponse { identity_id }))
}

/// Issue a session for a known identity without credentials
#[utoipa::path(
    post,
    path = "/api/v1/auth/sessions",
    tag = "auth",
    request_body = NewSessionRequest,
    responses(
        (status = 200, description = "Session issued", body = TokenPairResponse),
        (status = 400, description = "Invalid identity id", body = crate::error::ApiError),
        (status = 404, description = "Unknown identity", body = crate::error::ApiError),
    )
)]
pub async fn new_session_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.validator.validate(&request)?;
    let identity_id = state.validator.parse_identity_id(&request.identity_id)?;

    let pair = state.coordinator.issue_for_identity(identity_id).await?;

    Ok(Json(TokenPairResponse::new(pair, state.access_ttl_secs())))
}

/// Revoke the session of an identity
///
/// Succeeds whether or not a session existed.
#[utoipa::path(
    post,
    path = "/api/v1/auth/revoke",
    tag = "auth",
    request_body = RevokeRequest,
    responses(
        (status = 200, description = "Session revoked", body = RevokeResponse),
        (status = 400, description = "Invalid identity id", body = crate::error::ApiError),
    )
)]
pub async fn revoke_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RevokeRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.validator.validate(&request)?;
    let identity_id = state.validator.parse_identity_id(&request.identity_id)?;

    state.coordinator.revoke(identity_id).await?;

    Ok(Json(RevokeResponse {
        message: "session revoked".to_string(),
    }))
}

/// Exchange a refresh token for a new token pair
///
/// The access token may be expired. The refresh token is consumed.
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Tokens rotated", body = TokenPairResponse),
        (status = 401, description = "Invalid or superseded token", body = crate::error::ApiError),
        (status = 404, description = "No session", body = crate::error::ApiError),
        (status = 409, description = "Concurrent refresh won", body = crate::error::ApiError),
    )
)]
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.validator.validate(&request)?;

    let pair = state
        .coordinator
        .refresh(&request.access_token, &request.refresh_token)
        .await
        .map_err(|e| match e {
            TollgateError::NotFound => AppError::NotFound(MSG_REFRESH_NOT_FOUND),
            other => AppError::from(other),
        })?;

    Ok(Json(TokenPairResponse::new(pair, state.access_ttl_secs())))
}
