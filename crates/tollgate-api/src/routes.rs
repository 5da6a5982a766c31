//! API route definitions

use crate::handlers::session;
use crate::state::AppState;
use axum::{routing::post, Router};
use std::sync::Arc;

/// Create API v1 routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(session::register_handler))
        .route("/auth/login", post(session::login_handler))
        .route("/auth/validate", post(session::validate_handler))
        .route("/auth/sessions", post(session::new_session_handler))
        .route("/auth/revoke", post(session::revoke_handler))
        .route("/auth/refresh", post(session::refresh_handler))
}
