//! Trading board endpoints

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use super::{error_response, ErrorResponse};
use crate::dto::{
    BalancesResponse, DependencyStatsDto, OptionsResponse, OrderBookResponse,
    SelectOptionRequest, UserVaultResponse,
};
use crate::AppState;

/// Create trading routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/options", get(list_options))
        .route("/select", post(select_option))
        .route("/orderbook", get(order_book))
        .route("/balances", get(balances))
        .route("/vault", get(user_vault))
        .route("/stats", get(stats))
}

/// GET /trading/options - Listed options and the current selection
pub async fn list_options(State(state): State<AppState>) -> Json<OptionsResponse> {
    let trading = &state.session().trading;
    Json(OptionsResponse {
        options: trading.markets().to_vec(),
        selected: trading.selection().option,
    })
}

/// POST /trading/select - Switch the board to another option
pub async fn select_option(
    State(state): State<AppState>,
    Json(request): Json<SelectOptionRequest>,
) -> Result<Json<OptionsResponse>, ErrorResponse> {
    state
        .session()
        .trading
        .select_option(request.option)
        .map_err(error_response)?;

    Ok(list_options(State(state)).await)
}

/// GET /trading/orderbook - Valid orders for the selected option
pub async fn order_book(State(state): State<AppState>) -> Json<OrderBookResponse> {
    let trading = &state.session().trading;
    let option = trading.selection().option;

    Json(match trading.order_book() {
        Some(snapshot) => OrderBookResponse {
            option,
            loading: false,
            asks: snapshot.value.asks,
            bids: snapshot.value.bids,
            sequence: Some(snapshot.sequence),
            updated_at: Some(snapshot.published_at),
        },
        None => OrderBookResponse {
            option,
            loading: true,
            asks: Vec::new(),
            bids: Vec::new(),
            sequence: None,
            updated_at: None,
        },
    })
}

/// GET /trading/balances - Option token and WETH balances of the user
pub async fn balances(State(state): State<AppState>) -> Json<BalancesResponse> {
    let trading = &state.session().trading;
    let selection = trading.selection();

    Json(BalancesResponse {
        user: selection.user,
        option: selection.option,
        base: BalancesResponse::amount(trading.base_balance()),
        quote: BalancesResponse::amount(trading.quote_balance()),
    })
}

/// GET /trading/vault - Vault of the user on the selected option
pub async fn user_vault(State(state): State<AppState>) -> Json<UserVaultResponse> {
    let trading = &state.session().trading;
    let selection = trading.selection();
    let snapshot = trading.user_vault();

    Json(UserVaultResponse {
        option: selection.option,
        user: selection.user,
        loading: snapshot.is_none(),
        vault: snapshot.and_then(|s| s.value),
    })
}

/// GET /trading/stats - Refresh counters per dependency
pub async fn stats(State(state): State<AppState>) -> Json<Vec<DependencyStatsDto>> {
    Json(
        state
            .session()
            .trading
            .stats()
            .into_iter()
            .map(|d| DependencyStatsDto::new(d.name, d.stats))
            .collect(),
    )
}
