//! Wallet action endpoints

use std::str::FromStr;

use axum::{extract::State, routing::post, Json, Router};
use opyn_core::{ProtocolError, U256};

use super::{error_response, ErrorResponse};
use crate::dto::{ActionResponse, AddCollateralRequest, ApproveRequest, LiquidateRequest};
use crate::AppState;

/// Create action routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/approve", post(approve))
        .route("/liquidate", post(liquidate))
        .route("/add-collateral", post(add_collateral))
}

/// POST /actions/approve - Enable a token for the 0x ERC-20 proxy
pub async fn approve(
    State(state): State<AppState>,
    Json(request): Json<ApproveRequest>,
) -> Result<Json<ActionResponse>, ErrorResponse> {
    let session = state.session();
    let actions = session.actions().map_err(error_response)?;
    actions
        .approve(session.user(), request.asset)
        .await
        .map_err(error_response)?;

    Ok(Json(ActionResponse {
        operation: "approve".into(),
        confirmed: true,
        amount_wei: None,
    }))
}

/// POST /actions/liquidate - Liquidate part of an unsafe vault
pub async fn liquidate(
    State(state): State<AppState>,
    Json(request): Json<LiquidateRequest>,
) -> Result<Json<ActionResponse>, ErrorResponse> {
    let amount = U256::from_str(request.amount.trim()).map_err(|e| {
        error_response(ProtocolError::InvalidAmount {
            message: format!("'{}': {}", request.amount, e),
        })
    })?;

    let session = state.session();
    let actions = session.actions().map_err(error_response)?;
    actions
        .liquidate(session.user(), request.option, request.owner, amount)
        .await
        .map_err(error_response)?;

    Ok(Json(ActionResponse {
        operation: "liquidate".into(),
        confirmed: true,
        amount_wei: None,
    }))
}

/// POST /actions/add-collateral - Add ETH collateral to a vault
pub async fn add_collateral(
    State(state): State<AppState>,
    Json(request): Json<AddCollateralRequest>,
) -> Result<Json<ActionResponse>, ErrorResponse> {
    let session = state.session();
    let actions = session.actions().map_err(error_response)?;
    let wei = actions
        .add_eth_collateral(session.user(), request.option, request.owner, &request.amount)
        .await
        .map_err(error_response)?;

    Ok(Json(ActionResponse {
        operation: "add_eth_collateral".into(),
        confirmed: true,
        amount_wei: Some(wei.to_string()),
    }))
}
