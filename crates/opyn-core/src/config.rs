//! Configuration types for the Opyn client

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::constants::{OPTIONS_FACTORY, WETH_ADDRESS, ZERO_X_ERC20_PROXY};
use crate::{Address, Error, ListedOption, Network};

/// Ethereum node connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// JSON-RPC endpoint (e.g., "http://127.0.0.1:8545")
    pub rpc_url: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
        }
    }
}

/// Signing wallet configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Hex private key. Falls back to `OPYN_PRIVATE_KEY` when absent.
    #[serde(default)]
    pub private_key: Option<String>,
}

/// 0x standard relayer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Base URL of the standard relayer API (v3)
    pub url: String,
    /// Orders expiring within this many seconds are treated as invalid
    #[serde(default = "default_expiry_buffer_secs")]
    pub expiry_buffer_secs: u64,
}

fn default_expiry_buffer_secs() -> u64 {
    60
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: "https://api.0x.org/sra/v3".to_string(),
            expiry_buffer_secs: default_expiry_buffer_secs(),
        }
    }
}

/// Subgraph configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// GraphQL endpoint of the options subgraph
    pub url: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            url: "https://api.thegraph.com/subgraphs/name/opynfinance/opyn".to_string(),
        }
    }
}

/// Contract addresses the client talks to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractsConfig {
    pub options_factory: Address,
    pub erc20_proxy: Address,
    pub weth: Address,
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            options_factory: OPTIONS_FACTORY,
            erc20_proxy: ZERO_X_ERC20_PROXY,
            weth: WETH_ADDRESS,
        }
    }
}

/// Refresh interval per polled dependency, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollIntervals {
    #[serde(default = "default_order_book_ms")]
    pub order_book_ms: u64,
    #[serde(default = "default_base_balance_ms")]
    pub base_balance_ms: u64,
    #[serde(default = "default_quote_balance_ms")]
    pub quote_balance_ms: u64,
    #[serde(default = "default_user_vault_ms")]
    pub user_vault_ms: u64,
    #[serde(default = "default_vault_list_ms")]
    pub vault_list_ms: u64,
}

fn default_order_book_ms() -> u64 {
    1_000
}

fn default_base_balance_ms() -> u64 {
    30_000
}

fn default_quote_balance_ms() -> u64 {
    20_000
}

fn default_user_vault_ms() -> u64 {
    10_000
}

fn default_vault_list_ms() -> u64 {
    15_000
}

impl PollIntervals {
    pub fn order_book(&self) -> Duration {
        Duration::from_millis(self.order_book_ms)
    }

    pub fn base_balance(&self) -> Duration {
        Duration::from_millis(self.base_balance_ms)
    }

    pub fn quote_balance(&self) -> Duration {
        Duration::from_millis(self.quote_balance_ms)
    }

    pub fn user_vault(&self) -> Duration {
        Duration::from_millis(self.user_vault_ms)
    }

    pub fn vault_list(&self) -> Duration {
        Duration::from_millis(self.vault_list_ms)
    }
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            order_book_ms: default_order_book_ms(),
            base_balance_ms: default_base_balance_ms(),
            quote_balance_ms: default_quote_balance_ms(),
            user_vault_ms: default_user_vault_ms(),
            vault_list_ms: default_vault_list_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "opyn=debug,info".into(),
            format: "pretty".into(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub node: NodeConfig,

    #[serde(default)]
    pub wallet: WalletConfig,

    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub graph: GraphConfig,

    #[serde(default)]
    pub contracts: ContractsConfig,

    #[serde(default)]
    pub poll: PollIntervals,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Option series shown on the trading board
    #[serde(default)]
    pub markets: Vec<ListedOption>,

    /// Network (mainnet or kovan)
    #[serde(default = "default_network")]
    pub network: Network,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

fn default_network() -> Network {
    Network::Mainnet
}

fn default_api_port() -> u16 {
    18545
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node: NodeConfig::default(),
            wallet: WalletConfig::default(),
            relay: RelayConfig::default(),
            graph: GraphConfig::default(),
            contracts: ContractsConfig::default(),
            poll: PollIntervals::default(),
            logging: LoggingConfig::default(),
            markets: Vec::new(),
            network: default_network(),
            api_port: default_api_port(),
        }
    }
}

impl AppConfig {
    /// Parse a TOML document; missing sections fall back to defaults
    pub fn from_toml_str(contents: &str) -> Result<Self, Error> {
        toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }
}
