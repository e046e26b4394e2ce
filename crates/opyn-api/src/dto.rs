//! Data Transfer Objects for API requests and responses

use chrono::{DateTime, Utc};
use convexity::VaultView;
use opyn_core::{Address, ListedOption, Order, TxNotification, VaultRaw, U256};
use opyn_session::{PollerStats, Snapshot};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }
}

/// Listed options and the current selection
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsResponse {
    pub options: Vec<ListedOption>,
    pub selected: Option<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectOptionRequest {
    pub option: Address,
}

/// Wallet connection status
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletResponse {
    pub connected: bool,
    pub address: Option<Address>,
    /// A signing key is configured
    pub wallet_available: bool,
    pub connected_secs: Option<u64>,
}

/// Order book of the selected option
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBookResponse {
    pub option: Option<Address>,
    /// No refresh has completed for this option yet
    pub loading: bool,
    pub asks: Vec<Order>,
    pub bids: Vec<Order>,
    pub sequence: Option<u64>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Balances of the connected user, as decimal strings of raw units
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancesResponse {
    pub user: Option<Address>,
    pub option: Option<Address>,
    /// Option token balance
    pub base: Option<String>,
    /// WETH balance
    pub quote: Option<String>,
}

impl BalancesResponse {
    pub fn amount(snapshot: Option<Snapshot<U256>>) -> Option<String> {
        snapshot.map(|s| s.value.to_string())
    }
}

/// Vault of the connected user on the selected option
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserVaultResponse {
    pub option: Option<Address>,
    pub user: Option<Address>,
    pub loading: bool,
    pub vault: Option<VaultRaw>,
}

/// Vault list for one option
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultListResponse {
    pub option: Address,
    pub loading: bool,
    pub vaults: Vec<VaultView>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Refresh counters per dependency
#[derive(Debug, Clone, Serialize)]
pub struct DependencyStatsDto {
    pub name: String,
    pub ticks: u64,
    pub published: u64,
}

impl DependencyStatsDto {
    pub fn new(name: &str, stats: PollerStats) -> Self {
        Self {
            name: name.to_string(),
            ticks: stats.ticks,
            published: stats.published,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveRequest {
    /// Option token or WETH
    pub asset: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidateRequest {
    pub option: Address,
    pub owner: Address,
    /// oTokens to liquidate, decimal string of raw units
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCollateralRequest {
    pub option: Address,
    pub owner: Address,
    /// ETH amount, e.g. "0.5"
    pub amount: String,
}

/// Outcome of a confirmed action
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub operation: String,
    pub confirmed: bool,
    /// Amount sent, in wei, when the action carried value
    pub amount_wei: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<TxNotification>,
}
