//! API route handlers

pub mod actions;
pub mod health;
pub mod notifications;
pub mod options;
pub mod trading;
pub mod vaults;
pub mod wallet;

use axum::{http::StatusCode, routing::get, Json, Router};
use opyn_session::FlowError;

use crate::dto::ApiError;
use crate::AppState;

/// Error half of every handler result
pub type ErrorResponse = (StatusCode, Json<ApiError>);

/// Map a session error to its HTTP status and JSON body
pub fn error_response(e: impl Into<FlowError>) -> ErrorResponse {
    let e = e.into();
    (
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ApiError::new(e.error_code(), e.to_string())),
    )
}

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/trading", trading::router())
        .nest("/wallet", wallet::router())
        .nest("/vaults", vaults::router())
        .nest("/options", options::router())
        .nest("/actions", actions::router())
        .route("/notifications", get(notifications::recent))
        .with_state(state)
}
