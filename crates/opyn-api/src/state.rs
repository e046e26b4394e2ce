//! Application state shared across API handlers

use std::sync::Arc;
use std::time::Instant;

use opyn_core::{Address, AppConfig};
use opyn_session::{FlowError, Session};
use tokio::sync::RwLock;

/// State representing a connected wallet
#[derive(Clone, Debug)]
pub struct WalletState {
    pub address: Address,
    /// When the wallet was connected
    pub connected_at: Instant,
}

impl WalletState {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            connected_at: Instant::now(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    session: Session,
    wallet: RwLock<Option<WalletState>>,
}

impl AppState {
    pub fn new(config: AppConfig, session: Session) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                session,
                wallet: RwLock::new(None),
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Get current wallet state
    pub async fn wallet(&self) -> Option<WalletState> {
        self.inner.wallet.read().await.clone()
    }

    /// Connect the signing wallet and re-key the user dependencies.
    ///
    /// Connecting an already connected wallet keeps its original timestamp.
    pub async fn connect_wallet(&self) -> Result<WalletState, FlowError> {
        let mut wallet = self.inner.wallet.write().await;
        let address = self.inner.session.connect()?;

        match wallet.as_ref() {
            Some(current) if current.address == address => Ok(current.clone()),
            _ => {
                let state = WalletState::new(address);
                *wallet = Some(state.clone());
                Ok(state)
            }
        }
    }

    /// Disconnect wallet (clear wallet state)
    pub async fn disconnect_wallet(&self) {
        let mut wallet = self.inner.wallet.write().await;
        *wallet = None;
        self.inner.session.disconnect();
    }

    /// Stop every refresh timer
    pub fn shutdown(&self) {
        self.inner.session.shutdown();
    }
}
