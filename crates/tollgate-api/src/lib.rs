//! Tollgate API - session token service
//!
//! Password-authenticated sessions backed by RS256 access/refresh token
//! pairs, with single-use refresh token rotation, exposed over HTTP/JSON.

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{health, session};
use crate::state::AppState;

/// OpenAPI document
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness_check,
        session::register_handler,
        session::login_handler,
        session::validate_handler,
        session::new_session_handler,
        session::revoke_handler,
        session::refresh_handler,
    ),
    components(schemas(
        auth::RegisterRequest,
        auth::LoginRequest,
        auth::ValidateRequest,
        auth::NewSessionRequest,
        auth::RevokeRequest,
        auth::RefreshRequest,
        auth::IdentityResponse,
        auth::ValidateResponse,
        auth::TokenPairResponse,
        auth::RevokeResponse,
        health::HealthResponse,
        health::ReadinessResponse,
        error::ApiError,
    )),
    tags(
        (name = "auth", description = "Session lifecycle"),
        (name = "health", description = "Liveness and readiness probes"),
    )
)]
pub struct ApiDoc;

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/api/v1", routes::api_routes())
        .layer(middleware::from_fn_with_state(state.clone(), count_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// Router over an in-memory store with test keys
#[cfg(any(test, feature = "test-utils"))]
pub fn create_router_for_testing() -> Router {
    create_router(testing::test_state())
}

async fn count_requests(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    state.increment_requests();
    next.run(request).await
}
