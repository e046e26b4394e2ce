//! Live data behind the trading board
//!
//! Four dependencies are kept fresh for the selected option and the
//! connected user:
//!
//! | dependency    | key               | read                           |
//! |---------------|-------------------|--------------------------------|
//! | order book    | option            | relay book, option vs WETH     |
//! | base balance  | (option, user)    | option token balance           |
//! | user vault    | (option, user)    | subgraph vault                 |
//! | quote balance | user              | WETH balance                   |
//!
//! Every selection change re-keys all four; pollers whose key did not change
//! keep their timer.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use convexity::{fetch_balance, fetch_order_book, fetch_user_vault, OrderBookSnapshot};
use opyn_core::{
    Address, AppConfig, ChainReader, GraphReader, ListedOption, OptionKind, ProtocolError,
    RelayReader, SourceError, VaultRaw, U256,
};
use parking_lot::Mutex;
use serde::Serialize;

use crate::poller::{Poller, PollerStats, Refresh, Snapshot};
use crate::Sources;

/// Relay order book for an option against the quote token
pub struct OrderBookRefresh {
    relay: Arc<dyn RelayReader>,
    quote: Address,
    expiry_buffer_secs: u64,
}

#[async_trait]
impl Refresh for OrderBookRefresh {
    type Key = Address;
    type Output = OrderBookSnapshot;

    fn name(&self) -> &'static str {
        "order_book"
    }

    async fn fetch(&self, option: &Address) -> Result<OrderBookSnapshot, SourceError> {
        let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
        fetch_order_book(
            self.relay.as_ref(),
            *option,
            self.quote,
            now,
            self.expiry_buffer_secs,
        )
        .await
    }
}

/// Token balance of a possibly absent user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BalanceKey {
    pub asset: Address,
    pub user: Option<Address>,
}

pub struct BalanceRefresh {
    chain: Arc<dyn ChainReader>,
    name: &'static str,
}

#[async_trait]
impl Refresh for BalanceRefresh {
    type Key = BalanceKey;
    type Output = U256;

    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self, key: &BalanceKey) -> Result<U256, SourceError> {
        match key.user {
            Some(user) => fetch_balance(self.chain.as_ref(), key.asset, user).await,
            None => Ok(U256::ZERO),
        }
    }
}

/// Vault of a possibly absent user on one option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VaultKey {
    pub option: Address,
    pub user: Option<Address>,
}

pub struct UserVaultRefresh {
    graph: Arc<dyn GraphReader>,
}

#[async_trait]
impl Refresh for UserVaultRefresh {
    type Key = VaultKey;
    type Output = Option<VaultRaw>;

    fn name(&self) -> &'static str {
        "user_vault"
    }

    async fn fetch(&self, key: &VaultKey) -> Result<Option<VaultRaw>, SourceError> {
        match key.user {
            Some(user) => fetch_user_vault(self.graph.as_ref(), user, key.option).await,
            None => Ok(None),
        }
    }
}

/// What the board is currently showing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub option: Option<Address>,
    pub user: Option<Address>,
}

/// Poller counters by dependency name
#[derive(Debug, Clone, Serialize)]
pub struct DependencyStats {
    pub name: &'static str,
    #[serde(flatten)]
    pub stats: PollerStats,
}

pub struct TradingSession {
    markets: Vec<ListedOption>,
    quote: Address,
    selection: Mutex<Selection>,
    order_book: Poller<OrderBookRefresh>,
    base_balance: Poller<BalanceRefresh>,
    quote_balance: Poller<BalanceRefresh>,
    user_vault: Poller<UserVaultRefresh>,
}

impl TradingSession {
    pub fn new(sources: &Sources, config: &AppConfig) -> Self {
        let quote = config.contracts.weth;
        let poll = &config.poll;

        Self {
            markets: config.markets.clone(),
            quote,
            selection: Mutex::new(Selection::default()),
            order_book: Poller::new(
                Arc::new(OrderBookRefresh {
                    relay: Arc::clone(&sources.relay),
                    quote,
                    expiry_buffer_secs: config.relay.expiry_buffer_secs,
                }),
                poll.order_book(),
            ),
            base_balance: Poller::new(
                Arc::new(BalanceRefresh {
                    chain: Arc::clone(&sources.chain),
                    name: "base_balance",
                }),
                poll.base_balance(),
            ),
            quote_balance: Poller::new(
                Arc::new(BalanceRefresh {
                    chain: Arc::clone(&sources.chain),
                    name: "quote_balance",
                }),
                poll.quote_balance(),
            ),
            user_vault: Poller::new(
                Arc::new(UserVaultRefresh {
                    graph: Arc::clone(&sources.graph),
                }),
                poll.user_vault(),
            ),
        }
    }

    /// Catalogue of listed options
    pub fn markets(&self) -> &[ListedOption] {
        &self.markets
    }

    /// Second listed put, falling back to the first put, then the first market
    pub fn default_option(markets: &[ListedOption]) -> Option<Address> {
        let mut puts = markets.iter().filter(|m| m.kind == OptionKind::Put);
        let first_put = puts.next();
        puts.next()
            .or(first_put)
            .or_else(|| markets.first())
            .map(|m| m.address)
    }

    /// Arm every dependency for the default selection
    pub fn start(&self) {
        let mut selection = self.selection.lock();
        if selection.option.is_none() {
            selection.option = Self::default_option(&self.markets);
        }
        tracing::info!(
            option = ?selection.option,
            markets = self.markets.len(),
            "Trading session started"
        );
        self.rekey(*selection);
    }

    /// Switch the board to another listed option
    pub fn select_option(&self, option: Address) -> Result<(), ProtocolError> {
        if !self.markets.iter().any(|m| m.address == option) {
            return Err(ProtocolError::UnknownOption {
                address: option.to_string(),
            });
        }

        let mut selection = self.selection.lock();
        selection.option = Some(option);
        tracing::debug!(%option, "Option selected");
        self.rekey(*selection);
        Ok(())
    }

    /// Connect (`Some`) or disconnect (`None`) the user
    pub fn set_user(&self, user: Option<Address>) {
        let mut selection = self.selection.lock();
        selection.user = user;
        tracing::debug!(user = ?user, "User changed");
        self.rekey(*selection);
    }

    pub fn selection(&self) -> Selection {
        *self.selection.lock()
    }

    pub fn selected_market(&self) -> Option<ListedOption> {
        let option = self.selection.lock().option?;
        self.markets.iter().find(|m| m.address == option).cloned()
    }

    fn rekey(&self, selection: Selection) {
        self.quote_balance.set_key(BalanceKey {
            asset: self.quote,
            user: selection.user,
        });

        let Some(option) = selection.option else {
            return;
        };
        self.order_book.set_key(option);
        self.base_balance.set_key(BalanceKey {
            asset: option,
            user: selection.user,
        });
        self.user_vault.set_key(VaultKey {
            option,
            user: selection.user,
        });
    }

    pub fn order_book(&self) -> Option<Snapshot<OrderBookSnapshot>> {
        self.order_book.latest()
    }

    /// Balance of the selected option token
    pub fn base_balance(&self) -> Option<Snapshot<U256>> {
        self.base_balance.latest()
    }

    /// WETH balance
    pub fn quote_balance(&self) -> Option<Snapshot<U256>> {
        self.quote_balance.latest()
    }

    pub fn user_vault(&self) -> Option<Snapshot<Option<VaultRaw>>> {
        self.user_vault.latest()
    }

    pub fn stats(&self) -> Vec<DependencyStats> {
        vec![
            DependencyStats {
                name: self.order_book.name(),
                stats: self.order_book.stats(),
            },
            DependencyStats {
                name: self.base_balance.name(),
                stats: self.base_balance.stats(),
            },
            DependencyStats {
                name: self.quote_balance.name(),
                stats: self.quote_balance.stats(),
            },
            DependencyStats {
                name: self.user_vault.name(),
                stats: self.user_vault.stats(),
            },
        ]
    }

    pub fn shutdown(&self) {
        self.order_book.shutdown();
        self.base_balance.shutdown();
        self.quote_balance.shutdown();
        self.user_vault.shutdown();
    }
}
