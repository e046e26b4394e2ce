//! Convexity protocol state types

use chrono::{DateTime, Utc};
use opyn_core::{Address, Asset, ExerciseStyle, OptionKind, Order, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An option series, from user input to deployed contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub kind: OptionKind,
    pub style: ExerciseStyle,
    /// Strike in USD as entered
    pub strike_price: Decimal,
    pub expiry: DateTime<Utc>,
    pub collateral: Asset,
    pub underlying: Asset,
    pub strike_asset: Asset,
    pub name: String,
    pub symbol: String,
    /// Set once the creation transaction confirms
    pub address: Option<Address>,
}

/// Validated order book for one (base, quote) pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub asks: Vec<Order>,
    pub bids: Vec<Order>,
}

/// A vault with its derived health
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultView {
    pub owner: Address,
    /// Collateral in the collateral asset's smallest unit
    pub collateral: U256,
    /// Issued oTokens in raw units
    pub options_issued_raw: U256,
    /// Issued oTokens scaled by the contract decimals
    pub options_issued: f64,
    /// Collateral value over protected value; `None` when nothing is issued
    pub ratio: Option<f64>,
    /// `ratio` above the contract's minimum collateralization ratio
    pub is_safe: bool,
    /// The contract reports the vault as unsafe
    pub is_liquidatable: bool,
}
