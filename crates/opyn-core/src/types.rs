//! Core type definitions shared across the workspace

use std::fmt;

use serde::{Deserialize, Serialize};

pub use alloy_primitives::{Address, TxHash, U256};

/// Network type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Kovan,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Kovan => "kovan",
        }
    }

    /// EIP-155 chain id used when signing
    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Mainnet => 1,
            Self::Kovan => 42,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Put or call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Put,
    Call,
}

impl OptionKind {
    /// Label used in option names and symbols ("Put" / "Call")
    pub fn label(&self) -> &'static str {
        match self {
            Self::Put => "Put",
            Self::Call => "Call",
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Exercise style of an option series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseStyle {
    American,
    European,
}

/// A token as the protocol sees it: the factory addresses assets by symbol,
/// everything else by contract address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
}

impl Asset {
    pub fn new(symbol: impl Into<String>, address: Address, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            address,
            decimals,
        }
    }

    /// Exponent the factory expects for this asset (`-decimals`)
    pub fn exponent(&self) -> i32 {
        -i32::from(self.decimals)
    }
}

/// An option series listed on the trading board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedOption {
    pub address: Address,
    pub symbol: String,
    pub kind: OptionKind,
    /// Strike in USD
    pub strike_price: f64,
    pub decimals: u8,
    pub collateral: Asset,
}

/// Raw vault position as read from the chain or the subgraph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultRaw {
    pub owner: Address,
    pub collateral: U256,
    pub options_issued: U256,
    pub underlying: U256,
}

/// Contract parameters needed to derive vault health
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionDetail {
    /// Strike asset contract (zero address for ETH)
    pub strike_asset: Address,
    /// oToken decimals
    pub decimals: u8,
    /// Minimum collateralization ratio (value * 10^exponent)
    pub min_ratio: f64,
    /// Strike price (value * 10^exponent)
    pub strike_price: f64,
    /// Price oracle contract
    pub oracle: Address,
}

/// A signed 0x order together with the relay's fill metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_hash: String,
    pub maker_address: Address,
    pub taker_address: Address,
    pub fee_recipient_address: Address,
    pub sender_address: Address,
    pub maker_asset_amount: U256,
    pub taker_asset_amount: U256,
    pub maker_fee: U256,
    pub taker_fee: U256,
    pub maker_asset_data: String,
    pub taker_asset_data: String,
    pub expiration_time_seconds: u64,
    pub salt: String,
    pub exchange_address: Address,
    pub chain_id: u64,
    pub signature: String,
    pub remaining_fillable_taker_amount: U256,
}

/// Raw order book as served by the relay
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBook {
    pub asks: Vec<Order>,
    pub bids: Vec<Order>,
}

/// Arguments of the factory's `createOptionsContract` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOptionParams {
    pub collateral: String,
    pub collateral_exp: i32,
    pub underlying: String,
    pub underlying_exp: i32,
    pub decimals_exp: i32,
    pub strike_price: u64,
    pub strike_exp: i32,
    pub strike_asset: String,
    /// Expiry, seconds since epoch
    pub expiry: u64,
    /// Exercise window, seconds since epoch
    pub window: u64,
}

/// Lifecycle of a submitted transaction as surfaced to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Submitted,
    Confirmed,
    Failed,
}

/// Notification keyed on a transaction hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxNotification {
    pub status: TxStatus,
    /// "create_option" | "set_detail" | "approve" | "liquidate" | "add_eth_collateral"
    pub operation: String,
    pub description: String,
    pub tx_hash: Option<TxHash>,
    pub timestamp: u64,
}

impl TxNotification {
    pub fn new(
        status: TxStatus,
        operation: impl Into<String>,
        description: impl Into<String>,
        tx_hash: Option<TxHash>,
    ) -> Self {
        Self {
            status,
            operation: operation.into(),
            description: description.into(),
            tx_hash,
            timestamp: chrono::Utc::now().timestamp().max(0) as u64,
        }
    }
}

/// Constants
pub mod constants {
    use super::Address;

    /// Seconds in a day; european options stop exercising one day before expiry
    pub const SECONDS_PER_DAY: u64 = 86_400;

    /// USDC on mainnet
    pub const USDC_ADDRESS: Address =
        alloy_primitives::address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
    pub const USDC_DECIMALS: u8 = 6;

    /// WETH on mainnet (quote asset of every option order book)
    pub const WETH_ADDRESS: Address =
        alloy_primitives::address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
    pub const ETH_DECIMALS: u8 = 18;

    /// 0x v3 ERC-20 asset proxy on mainnet
    pub const ZERO_X_ERC20_PROXY: Address =
        alloy_primitives::address!("95e6f48254609a6ee006f7d493c8e5fb97094cef");

    /// Opyn v1 options factory on mainnet
    pub const OPTIONS_FACTORY: Address =
        alloy_primitives::address!("cc5d905b9c2c8c9329eb4e25dc086369d6c7777c");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_exponent() {
        let usdc = Asset::new("USDC", constants::USDC_ADDRESS, constants::USDC_DECIMALS);
        assert_eq!(usdc.exponent(), -6);

        let eth = Asset::new("ETH", Address::ZERO, constants::ETH_DECIMALS);
        assert_eq!(eth.exponent(), -18);
    }

    #[test]
    fn test_network_display() {
        assert_eq!(Network::Mainnet.as_str(), "mainnet");
        assert_eq!(Network::Kovan.to_string(), "kovan");
        assert_eq!(Network::Kovan.chain_id(), 42);
    }

    #[test]
    fn test_option_kind_serde() {
        let json = serde_json::to_string(&OptionKind::Call).unwrap();
        assert_eq!(json, "\"call\"");
        assert_eq!(OptionKind::Put.label(), "Put");
    }
}
