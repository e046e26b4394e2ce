//! Convexity (Opyn v1) Options Protocol Implementation
//!
//! Option series are deployed through a factory that takes collateral,
//! underlying and strike assets by symbol. Writers lock collateral in a
//! per-owner vault and mint oTokens against it; vaults that fall below the
//! contract's minimum collateralization ratio can be liquidated.

pub mod calculator;
pub mod constants;
pub mod fetch;
pub mod state;
pub mod tx_builder;

pub use calculator::{derive_vault_views, filter_valid_orders, is_valid_order, vault_ratio};
pub use fetch::{fetch_balance, fetch_order_book, fetch_user_vault, fetch_vault_views};
pub use state::{Instrument, OrderBookSnapshot, VaultView};
pub use tx_builder::{encode_strike, exercise_window, is_valid_strike, option_name, option_symbol};
