//! Option creation endpoints

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use opyn_session::{CreateRequest, FlowStatus};

use super::{error_response, ErrorResponse};
use crate::AppState;

/// Create option creation routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/create/status", get(status))
        .route("/create/reset", post(reset))
}

/// POST /options/create - Validate and start creating a series.
///
/// Returns once the request is accepted; poll `/options/create/status`
/// for progress.
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateRequest>,
) -> Result<Json<FlowStatus>, ErrorResponse> {
    let session = state.session();
    let flow = session.create_flow().map_err(error_response)?;
    let status = flow
        .spawn(&request, session.user())
        .map_err(error_response)?;
    Ok(Json(status))
}

/// GET /options/create/status - Current state and progress
pub async fn status(State(state): State<AppState>) -> Result<Json<FlowStatus>, ErrorResponse> {
    let flow = state.session().create_flow().map_err(error_response)?;
    Ok(Json(flow.status()))
}

/// POST /options/create/reset - Clear a finished or failed flow
pub async fn reset(State(state): State<AppState>) -> Result<Json<FlowStatus>, ErrorResponse> {
    let flow = state.session().create_flow().map_err(error_response)?;
    flow.reset().map_err(error_response)?;
    Ok(Json(flow.status()))
}
