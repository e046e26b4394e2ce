//! Narrow interfaces to the external collaborators
//!
//! The session layer only ever sees these traits. Concrete implementations
//! live in `eth-client` (chain reads and wallet-signed writes) and
//! `relay-client` (0x relay and subgraph).

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::errors::{SourceError, TxError};
use crate::types::{
    Address, CreateOptionParams, OptionDetail, OrderBook, TxNotification, VaultRaw, U256,
};

/// Read-only chain queries
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// ERC-20 balance of `user` in `asset`
    async fn balance_of(&self, asset: Address, user: Address) -> Result<U256, SourceError>;

    /// Recorded owner of an option contract
    async fn owner(&self, contract: Address) -> Result<Address, SourceError>;

    /// Strike, decimals, minimum ratio, strike price and oracle of an option contract
    async fn option_detail(&self, contract: Address) -> Result<OptionDetail, SourceError>;

    /// Vaults of the given owners on one option contract
    async fn vaults(
        &self,
        owners: &[Address],
        contract: Address,
    ) -> Result<Vec<VaultRaw>, SourceError>;

    /// Oracle price of `asset`, in wei
    async fn price(&self, oracle: Address, asset: Address) -> Result<U256, SourceError>;

    /// Whether the vault of `owner` can be liquidated
    async fn is_unsafe(&self, contract: Address, owner: Address) -> Result<bool, SourceError>;
}

/// Read-only order-book relay queries
#[async_trait]
pub trait RelayReader: Send + Sync {
    async fn order_book(&self, base: Address, quote: Address) -> Result<OrderBook, SourceError>;
}

/// Read-only subgraph queries
#[async_trait]
pub trait GraphReader: Send + Sync {
    /// Every address that has opened a vault on any option contract
    async fn all_vault_owners(&self) -> Result<Vec<Address>, SourceError>;

    /// Vault of `user` on `option`, `None` when the user never opened one
    async fn vault(&self, user: Address, option: Address) -> Result<Option<VaultRaw>, SourceError>;
}

/// Wallet-signed contract calls. Each call resolves once the transaction is
/// mined and publishes its hash through the submitter's [`TxNotifier`].
#[async_trait]
pub trait TxSubmitter: Send + Sync {
    /// Identity transactions are sent from, `None` when no wallet is available
    fn sender(&self) -> Option<Address>;

    /// Deploy a new option series, returning its address
    async fn create_option(&self, params: &CreateOptionParams) -> Result<Address, TxError>;

    async fn set_detail(&self, contract: Address, symbol: &str, name: &str)
        -> Result<(), TxError>;

    async fn approve(&self, asset: Address, spender: Address) -> Result<(), TxError>;

    async fn liquidate(
        &self,
        contract: Address,
        owner: Address,
        amount: U256,
    ) -> Result<(), TxError>;

    async fn add_eth_collateral(
        &self,
        contract: Address,
        owner: Address,
        amount: U256,
    ) -> Result<(), TxError>;
}

/// Fan-out channel for transaction notifications
#[derive(Clone)]
pub struct TxNotifier {
    sender: broadcast::Sender<TxNotification>,
}

impl TxNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a notification. Having no subscribers is not an error.
    pub fn notify(&self, notification: TxNotification) {
        let _ = self.sender.send(notification);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TxNotification> {
        self.sender.subscribe()
    }
}

impl Default for TxNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TxStatus;

    #[tokio::test]
    async fn test_notifier_fan_out() {
        let notifier = TxNotifier::default();
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();

        notifier.notify(TxNotification::new(
            TxStatus::Submitted,
            "approve",
            "Enable WETH",
            None,
        ));

        assert_eq!(a.recv().await.unwrap().operation, "approve");
        assert_eq!(b.recv().await.unwrap().status, TxStatus::Submitted);
    }

    #[test]
    fn test_notify_without_subscribers() {
        let notifier = TxNotifier::new(4);
        notifier.notify(TxNotification::new(TxStatus::Failed, "liquidate", "", None));
    }
}
