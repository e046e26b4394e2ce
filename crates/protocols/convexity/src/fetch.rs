//! Data fetchers over the chain, relay and subgraph readers
//!
//! Each fetcher performs every read one refresh needs and returns a complete
//! value; nothing here keeps state between calls.

use futures::future::try_join_all;
use opyn_core::{Address, ChainReader, GraphReader, RelayReader, SourceError, VaultRaw, U256};

use crate::calculator::{derive_vault_views, filter_valid_orders};
use crate::state::{OrderBookSnapshot, VaultView};

/// Fetch the order book for `base` against `quote`, keeping valid orders only.
pub async fn fetch_order_book(
    relay: &dyn RelayReader,
    base: Address,
    quote: Address,
    now_secs: u64,
    expiry_buffer_secs: u64,
) -> Result<OrderBookSnapshot, SourceError> {
    let book = relay.order_book(base, quote).await?;
    Ok(OrderBookSnapshot {
        asks: filter_valid_orders(book.asks, now_secs, expiry_buffer_secs),
        bids: filter_valid_orders(book.bids, now_secs, expiry_buffer_secs),
    })
}

/// Fetch a token balance
pub async fn fetch_balance(
    chain: &dyn ChainReader,
    asset: Address,
    user: Address,
) -> Result<U256, SourceError> {
    chain.balance_of(asset, user).await
}

/// Fetch the vault of `user` on `option` from the subgraph
pub async fn fetch_user_vault(
    graph: &dyn GraphReader,
    user: Address,
    option: Address,
) -> Result<Option<VaultRaw>, SourceError> {
    graph.vault(user, option).await
}

/// Fetch every vault on `option` with its derived health.
///
/// Owners come from the subgraph, positions and contract parameters from
/// the chain, and the strike price from the contract's oracle.
pub async fn fetch_vault_views(
    chain: &dyn ChainReader,
    graph: &dyn GraphReader,
    option: Address,
) -> Result<Vec<VaultView>, SourceError> {
    let (owners, detail) = tokio::try_join!(graph.all_vault_owners(), chain.option_detail(option))?;

    let (vaults, price) = tokio::try_join!(
        chain.vaults(&owners, option),
        chain.price(detail.oracle, detail.strike_asset),
    )?;

    let liquidatable = try_join_all(
        vaults
            .iter()
            .map(|vault| chain.is_unsafe(option, vault.owner)),
    )
    .await?;

    tracing::debug!(
        option = %option,
        owners = owners.len(),
        vaults = vaults.len(),
        "Fetched vault set"
    );

    Ok(derive_vault_views(&vaults, &detail, price, &liquidatable))
}
