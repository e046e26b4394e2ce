//! In-memory readers and submitter for session tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use opyn_core::{
    Address, Asset, ChainReader, CreateOptionParams, GraphReader, ListedOption, OptionDetail,
    OptionKind, OrderBook, RelayReader, SourceError, TxError, TxNotifier, TxSubmitter, VaultRaw,
    U256,
};
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::create_flow::FlowStatus;
use crate::Sources;

pub fn listed(byte: u8, kind: OptionKind) -> ListedOption {
    ListedOption {
        address: Address::repeat_byte(byte),
        symbol: format!("oETH {:02x}", byte),
        kind,
        strike_price: 100.0,
        decimals: 7,
        collateral: Asset::new("USDC", Address::repeat_byte(0xc0), 6),
    }
}

#[derive(Default)]
pub struct FakeChain {
    balance_calls: Mutex<Vec<(Address, Address)>>,
    owner: Mutex<Address>,
    owner_fails: AtomicBool,
    owner_hangs: AtomicBool,
}

impl FakeChain {
    pub fn balance_calls(&self) -> Vec<(Address, Address)> {
        self.balance_calls.lock().clone()
    }

    pub fn set_owner(&self, owner: Address) {
        *self.owner.lock() = owner;
    }

    pub fn fail_owner(&self) {
        self.owner_fails.store(true, Ordering::SeqCst);
    }

    /// Owner reads never resolve
    pub fn hang_owner(&self) {
        self.owner_hangs.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChainReader for FakeChain {
    async fn balance_of(&self, asset: Address, user: Address) -> Result<U256, SourceError> {
        self.balance_calls.lock().push((asset, user));
        Ok(U256::from(1_000u64))
    }

    async fn owner(&self, _contract: Address) -> Result<Address, SourceError> {
        if self.owner_hangs.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.owner_fails.load(Ordering::SeqCst) {
            return Err(SourceError::api("chain", "execution reverted"));
        }
        Ok(*self.owner.lock())
    }

    async fn option_detail(&self, _contract: Address) -> Result<OptionDetail, SourceError> {
        Ok(OptionDetail {
            strike_asset: Address::repeat_byte(0xc0),
            decimals: 0,
            min_ratio: 1.6,
            strike_price: 1.0,
            oracle: Address::repeat_byte(0x0a),
        })
    }

    async fn vaults(
        &self,
        owners: &[Address],
        _contract: Address,
    ) -> Result<Vec<VaultRaw>, SourceError> {
        Ok(owners
            .iter()
            .map(|owner| VaultRaw {
                owner: *owner,
                collateral: U256::from(200u64),
                options_issued: U256::from(100u64),
                underlying: U256::ZERO,
            })
            .collect())
    }

    async fn price(&self, _oracle: Address, _asset: Address) -> Result<U256, SourceError> {
        Ok(U256::from(1u64))
    }

    async fn is_unsafe(&self, _contract: Address, _owner: Address) -> Result<bool, SourceError> {
        Ok(false)
    }
}

#[derive(Default)]
pub struct FakeRelay {
    calls: AtomicUsize,
    last_base: Mutex<Option<Address>>,
}

impl FakeRelay {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_base(&self) -> Option<Address> {
        *self.last_base.lock()
    }
}

#[async_trait]
impl RelayReader for FakeRelay {
    async fn order_book(&self, base: Address, _quote: Address) -> Result<OrderBook, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_base.lock() = Some(base);
        Ok(OrderBook::default())
    }
}

#[derive(Default)]
pub struct FakeGraph {
    owners: Mutex<Vec<Address>>,
    owner_calls: AtomicUsize,
    vault_calls: AtomicUsize,
    fails: AtomicBool,
}

impl FakeGraph {
    pub fn set_owners(&self, owners: Vec<Address>) {
        *self.owners.lock() = owners;
    }

    pub fn owner_calls(&self) -> usize {
        self.owner_calls.load(Ordering::SeqCst)
    }

    pub fn vault_calls(&self) -> usize {
        self.vault_calls.load(Ordering::SeqCst)
    }

    pub fn fail(&self, fails: bool) {
        self.fails.store(fails, Ordering::SeqCst);
    }
}

#[async_trait]
impl GraphReader for FakeGraph {
    async fn all_vault_owners(&self) -> Result<Vec<Address>, SourceError> {
        self.owner_calls.fetch_add(1, Ordering::SeqCst);
        if self.fails.load(Ordering::SeqCst) {
            return Err(SourceError::api("subgraph", "indexing error"));
        }
        Ok(self.owners.lock().clone())
    }

    async fn vault(&self, user: Address, _option: Address) -> Result<Option<VaultRaw>, SourceError> {
        self.vault_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(VaultRaw {
            owner: user,
            collateral: U256::from(5u64),
            options_issued: U256::from(1u64),
            underlying: U256::ZERO,
        }))
    }
}

pub struct FakeSubmitter {
    sender: Option<Address>,
    deployed: Address,
    create_fails: AtomicBool,
    detail_fails: AtomicBool,
    created: Mutex<Vec<CreateOptionParams>>,
    details: Mutex<Vec<(Address, String, String)>>,
    approvals: Mutex<Vec<(Address, Address)>>,
    liquidations: Mutex<Vec<(Address, Address, U256)>>,
    collateral: Mutex<Vec<(Address, Address, U256)>>,
    progress: Mutex<Option<watch::Receiver<FlowStatus>>>,
    progress_at_detail: Mutex<Option<f64>>,
}

impl FakeSubmitter {
    pub fn new(sender: Option<Address>) -> Self {
        Self {
            sender,
            deployed: Address::repeat_byte(0xde),
            create_fails: AtomicBool::new(false),
            detail_fails: AtomicBool::new(false),
            created: Mutex::new(Vec::new()),
            details: Mutex::new(Vec::new()),
            approvals: Mutex::new(Vec::new()),
            liquidations: Mutex::new(Vec::new()),
            collateral: Mutex::new(Vec::new()),
            progress: Mutex::new(None),
            progress_at_detail: Mutex::new(None),
        }
    }

    pub fn deployed(&self) -> Address {
        self.deployed
    }

    pub fn fail_create(&self) {
        self.create_fails.store(true, Ordering::SeqCst);
    }

    pub fn fail_detail(&self) {
        self.detail_fails.store(true, Ordering::SeqCst);
    }

    /// Record flow progress at the moment `set_detail` is submitted
    pub fn watch_progress(&self, rx: watch::Receiver<FlowStatus>) {
        *self.progress.lock() = Some(rx);
    }

    pub fn progress_at_detail(&self) -> Option<f64> {
        *self.progress_at_detail.lock()
    }

    pub fn created(&self) -> Vec<CreateOptionParams> {
        self.created.lock().clone()
    }

    pub fn details(&self) -> Vec<(Address, String, String)> {
        self.details.lock().clone()
    }

    pub fn approvals(&self) -> Vec<(Address, Address)> {
        self.approvals.lock().clone()
    }

    pub fn liquidations(&self) -> Vec<(Address, Address, U256)> {
        self.liquidations.lock().clone()
    }

    pub fn collateral(&self) -> Vec<(Address, Address, U256)> {
        self.collateral.lock().clone()
    }
}

#[async_trait]
impl TxSubmitter for FakeSubmitter {
    fn sender(&self) -> Option<Address> {
        self.sender
    }

    async fn create_option(&self, params: &CreateOptionParams) -> Result<Address, TxError> {
        self.created.lock().push(params.clone());
        if self.create_fails.load(Ordering::SeqCst) {
            return Err(TxError::SubmissionFailed {
                message: "user rejected".into(),
            });
        }
        Ok(self.deployed)
    }

    async fn set_detail(&self, contract: Address, symbol: &str, name: &str) -> Result<(), TxError> {
        let progress = self
            .progress
            .lock()
            .as_ref()
            .map(|rx| rx.borrow().progress);
        *self.progress_at_detail.lock() = progress;

        self.details
            .lock()
            .push((contract, symbol.to_string(), name.to_string()));
        if self.detail_fails.load(Ordering::SeqCst) {
            return Err(TxError::Reverted {
                tx_hash: "0x01".into(),
            });
        }
        Ok(())
    }

    async fn approve(&self, asset: Address, spender: Address) -> Result<(), TxError> {
        self.approvals.lock().push((asset, spender));
        Ok(())
    }

    async fn liquidate(&self, contract: Address, owner: Address, amount: U256) -> Result<(), TxError> {
        self.liquidations.lock().push((contract, owner, amount));
        Ok(())
    }

    async fn add_eth_collateral(
        &self,
        contract: Address,
        owner: Address,
        amount: U256,
    ) -> Result<(), TxError> {
        self.collateral.lock().push((contract, owner, amount));
        Ok(())
    }
}

pub struct Fakes {
    pub chain: Arc<FakeChain>,
    pub relay: Arc<FakeRelay>,
    pub graph: Arc<FakeGraph>,
    pub submitter: Arc<FakeSubmitter>,
    pub notifier: TxNotifier,
}

impl Default for Fakes {
    fn default() -> Self {
        Self {
            chain: Arc::new(FakeChain::default()),
            relay: Arc::new(FakeRelay::default()),
            graph: Arc::new(FakeGraph::default()),
            submitter: Arc::new(FakeSubmitter::new(Some(Address::repeat_byte(0x11)))),
            notifier: TxNotifier::default(),
        }
    }
}

impl Fakes {
    /// Address of the signing wallet
    pub fn user(&self) -> Address {
        Address::repeat_byte(0x11)
    }

    pub fn sources(&self) -> Sources {
        Sources {
            chain: self.chain.clone(),
            relay: self.relay.clone(),
            graph: self.graph.clone(),
            submitter: Some(self.submitter.clone() as Arc<dyn TxSubmitter>),
            notifier: self.notifier.clone(),
        }
    }
}
