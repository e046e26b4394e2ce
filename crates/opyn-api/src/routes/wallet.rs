//! Wallet connection endpoints

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use super::{error_response, ErrorResponse};
use crate::dto::WalletResponse;
use crate::AppState;

/// Create wallet routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_wallet))
        .route("/connect", post(connect))
        .route("/disconnect", post(disconnect))
}

/// GET /wallet - Current connection
pub async fn get_wallet(State(state): State<AppState>) -> Json<WalletResponse> {
    let wallet = state.wallet().await;
    Json(WalletResponse {
        connected: wallet.is_some(),
        address: wallet.as_ref().map(|w| w.address),
        wallet_available: state.session().wallet().is_some(),
        connected_secs: wallet.map(|w| w.connected_at.elapsed().as_secs()),
    })
}

/// POST /wallet/connect - Connect the configured signing wallet
pub async fn connect(
    State(state): State<AppState>,
) -> Result<Json<WalletResponse>, ErrorResponse> {
    let wallet = state.connect_wallet().await.map_err(error_response)?;
    tracing::info!(address = %wallet.address, "Wallet connected via API");
    Ok(get_wallet(State(state)).await)
}

/// POST /wallet/disconnect - Forget the connected wallet
pub async fn disconnect(State(state): State<AppState>) -> Json<WalletResponse> {
    state.disconnect_wallet().await;
    get_wallet(State(state)).await
}
