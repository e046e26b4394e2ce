//! Vault list endpoints

use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use opyn_core::{Address, ProtocolError};

use super::{error_response, ErrorResponse};
use crate::dto::VaultListResponse;
use crate::AppState;

/// Create vault routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:option", get(list_vaults))
        .route("/:option/watch", delete(unwatch))
}

fn require_listed(state: &AppState, option: Address) -> Result<(), ErrorResponse> {
    let listed = state
        .session()
        .trading
        .markets()
        .iter()
        .any(|m| m.address == option);
    if listed {
        Ok(())
    } else {
        Err(error_response(ProtocolError::UnknownOption {
            address: option.to_string(),
        }))
    }
}

/// GET /vaults/:option - Every vault on a listed option.
///
/// The first request starts the refresh; until it completes the list is
/// reported as loading.
pub async fn list_vaults(
    State(state): State<AppState>,
    Path(option): Path<Address>,
) -> Result<Json<VaultListResponse>, ErrorResponse> {
    require_listed(&state, option)?;
    let list = state.session().vaults.list(option);

    Ok(Json(VaultListResponse {
        option: list.option,
        loading: list.loading,
        vaults: list.vaults,
        updated_at: list.updated_at,
    }))
}

/// DELETE /vaults/:option/watch - Stop refreshing an option's vaults
pub async fn unwatch(
    State(state): State<AppState>,
    Path(option): Path<Address>,
) -> Json<bool> {
    Json(state.session().vaults.unwatch(option))
}
