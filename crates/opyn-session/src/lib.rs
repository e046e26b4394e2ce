//! opyn-session: Client-side controllers for the Opyn options board
//!
//! - [`poller`]: fixed-interval refresh of remote reads keyed by the current
//!   selection, discarding results that belong to a superseded key or that
//!   arrive after a newer one
//! - [`trading`]: order book, balances and user vault for the selected option
//! - [`vault_list`]: every vault on an option with its health
//! - [`create_flow`]: the option creation state machine and its progress
//! - [`actions`]: approvals, liquidation and collateral top-ups
//!
//! All controllers read through the traits in `opyn_core::sources`, so any
//! chain, relay or subgraph implementation can back them.

pub mod actions;
pub mod create_flow;
pub mod errors;
pub mod notifications;
pub mod poller;
pub mod trading;
pub mod vault_list;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use opyn_core::{
    Address, AppConfig, ChainReader, GraphReader, RelayReader, TxError, TxNotification,
    TxNotifier, TxSubmitter,
};
use tokio::task::JoinHandle;

pub use actions::{eth_to_wei, Actions};
pub use create_flow::{CreateFlow, CreateRequest, FlowState, FlowStatus};
pub use errors::FlowError;
pub use notifications::NotificationLog;
pub use poller::{Poller, PollerStats, Refresh, Snapshot};
pub use trading::{Selection, TradingSession};
pub use vault_list::{VaultBoard, VaultList};

/// Notifications kept for `recent_notifications`
const NOTIFICATION_LOG_CAPACITY: usize = 50;

/// External collaborators the session reads from and writes through
#[derive(Clone)]
pub struct Sources {
    pub chain: Arc<dyn ChainReader>,
    pub relay: Arc<dyn RelayReader>,
    pub graph: Arc<dyn GraphReader>,
    /// Absent when no signing key is configured
    pub submitter: Option<Arc<dyn TxSubmitter>>,
    pub notifier: TxNotifier,
}

/// Everything one connected client sees and can do
pub struct Session {
    pub trading: TradingSession,
    pub vaults: VaultBoard,
    create_flow: Option<Arc<CreateFlow>>,
    actions: Option<Actions>,
    wallet: Option<Address>,
    notifier: TxNotifier,
    notifications: Arc<NotificationLog>,
    log_task: JoinHandle<()>,
}

impl Session {
    /// Build the session. Must be called from within a Tokio runtime.
    pub fn new(sources: Sources, config: &AppConfig) -> Self {
        let create_flow = sources.submitter.as_ref().map(|submitter| {
            Arc::new(CreateFlow::new(
                Arc::clone(submitter),
                Arc::clone(&sources.chain),
            ))
        });
        let actions = sources
            .submitter
            .as_ref()
            .map(|submitter| Actions::new(Arc::clone(submitter), config.contracts.erc20_proxy));
        let wallet = sources.submitter.as_ref().and_then(|s| s.sender());

        let notifications = Arc::new(NotificationLog::new(NOTIFICATION_LOG_CAPACITY));
        let log_task = notifications.follow(&sources.notifier);

        Self {
            trading: TradingSession::new(&sources, config),
            vaults: VaultBoard::new(&sources, config.poll.vault_list()),
            create_flow,
            actions,
            wallet,
            notifier: sources.notifier,
            notifications,
            log_task,
        }
    }

    pub fn start(&self) {
        self.trading.start();
    }

    /// Address of the signing wallet, connected or not
    pub fn wallet(&self) -> Option<Address> {
        self.wallet
    }

    /// Currently connected user
    pub fn user(&self) -> Option<Address> {
        self.trading.selection().user
    }

    /// Connect the signing wallet as the current user
    pub fn connect(&self) -> Result<Address, FlowError> {
        let wallet = self.wallet.ok_or(FlowError::Transaction(TxError::NoSigner))?;
        self.trading.set_user(Some(wallet));
        tracing::info!(user = %wallet, "Wallet connected");
        Ok(wallet)
    }

    pub fn disconnect(&self) {
        self.trading.set_user(None);
        tracing::info!("Wallet disconnected");
    }

    pub fn create_flow(&self) -> Result<&Arc<CreateFlow>, FlowError> {
        self.create_flow
            .as_ref()
            .ok_or(FlowError::Transaction(TxError::NoSigner))
    }

    pub fn actions(&self) -> Result<&Actions, FlowError> {
        self.actions
            .as_ref()
            .ok_or(FlowError::Transaction(TxError::NoSigner))
    }

    pub fn notifier(&self) -> &TxNotifier {
        &self.notifier
    }

    pub fn recent_notifications(&self) -> Vec<TxNotification> {
        self.notifications.recent()
    }

    /// Stop every timer; in-flight reads are discarded on arrival
    pub fn shutdown(&self) {
        self.trading.shutdown();
        self.vaults.shutdown();
        self.log_task.abort();
        tracing::info!("Session stopped");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.log_task.abort();
    }
}
