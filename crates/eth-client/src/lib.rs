//! eth-client: Ethereum node access for the Opyn client
//!
//! Wraps an alloy HTTP provider with request timeouts and exposes the
//! protocol's read queries ([`opyn_core::ChainReader`]) and wallet-signed
//! writes ([`wallet::WalletSubmitter`], implementing [`opyn_core::TxSubmitter`]).

pub mod contracts;
pub mod queries;
pub mod wallet;

use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use opyn_core::{NodeConfig, SourceError};

pub use wallet::WalletSubmitter;

/// Default timeout for node API calls (30 seconds).
const NODE_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

const SOURCE_NAME: &str = "Ethereum node";

/// Result type for node client operations
pub type Result<T> = std::result::Result<T, SourceError>;

/// Read-only Ethereum node client
#[derive(Clone)]
pub struct EthClient {
    provider: DynProvider,
    config: NodeConfig,
}

impl EthClient {
    /// Create a client for the configured RPC endpoint. No request is made.
    pub fn new(config: NodeConfig) -> Result<Self> {
        let url = parse_rpc_url(&config.rpc_url)?;
        let provider = ProviderBuilder::new().connect_http(url).erased();
        Ok(Self { provider, config })
    }

    /// Get the underlying provider (for advanced usage)
    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    /// Get the current node configuration
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Get current block number
    pub async fn current_block(&self) -> Result<u64> {
        timed_request(self.provider.get_block_number()).await
    }

    /// Get the chain id reported by the node
    pub async fn chain_id(&self) -> Result<u64> {
        timed_request(self.provider.get_chain_id()).await
    }

    /// Check if node is online
    pub async fn is_online(&self) -> bool {
        self.current_block().await.is_ok()
    }
}

pub(crate) fn parse_rpc_url(raw: &str) -> Result<url::Url> {
    raw.parse().map_err(|e: url::ParseError| SourceError::Unreachable {
        source_name: SOURCE_NAME,
        url: format!("{}: {}", raw, e),
    })
}

/// Apply the node request timeout and flatten the error into [`SourceError`].
pub(crate) async fn timed_request<T, E: std::fmt::Display>(
    fut: impl std::future::IntoFuture<Output = std::result::Result<T, E>>,
) -> Result<T> {
    tokio::time::timeout(NODE_REQUEST_TIMEOUT, fut)
        .await
        .map_err(|_| SourceError::Timeout {
            source_name: SOURCE_NAME,
            secs: NODE_REQUEST_TIMEOUT.as_secs(),
        })?
        .map_err(|e| SourceError::api(SOURCE_NAME, e))
}
