//! Option series creation
//!
//! ```text
//! Idle -> Submitting -> AwaitingPermissionCheck -> SettingDetail -> Done
//!                   \                          \-> DoneNoPermission
//!                    \-> Failed (creation or owner read failed, or cancelled)
//! ```
//!
//! A claimed request that is dropped before reaching a terminal state, for
//! example because the caller's future was cancelled, fails the flow so a
//! later `reset` or `create` is not locked out.
//!
//! The creation transaction deploys the series; if the connected user turns
//! out to own it, a second transaction records its display name and symbol.
//! A failed metadata transaction still completes the flow, with the
//! permission flag downgraded.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use convexity::{is_valid_strike, Instrument};
use opyn_core::{
    Address, ChainReader, CreateOptionParams, ExerciseStyle, OptionKind, TxError, TxSubmitter,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::errors::FlowError;

pub const WALLET_REQUIRED: &str = "Please connect wallet first";
pub const INVALID_STRIKE: &str = "Invalid strike price.";
pub const CANCELLED: &str = "Option creation was cancelled";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    Idle,
    Submitting,
    AwaitingPermissionCheck,
    SettingDetail,
    DoneNoPermission,
    Done,
    Failed,
}

impl FlowState {
    /// Progress shown on entering the state; `Failed` keeps what was reached
    pub fn progress(&self) -> Option<f64> {
        match self {
            Self::Idle => Some(0.0),
            Self::Submitting => Some(0.3),
            Self::AwaitingPermissionCheck => Some(0.6),
            Self::SettingDetail => Some(0.9),
            Self::Done | Self::DoneNoPermission => Some(1.0),
            Self::Failed => None,
        }
    }

    /// Whether a transaction of this flow may still be outstanding
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            Self::Submitting | Self::AwaitingPermissionCheck | Self::SettingDetail
        )
    }
}

/// User input for a new series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub kind: OptionKind,
    pub style: ExerciseStyle,
    /// Strike in USD
    pub strike_price: Decimal,
    pub expiry: DateTime<Utc>,
}

/// Observable state of the flow
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowStatus {
    pub state: FlowState,
    pub progress: f64,
    /// Series being created; its address is set once deployed
    pub instrument: Option<Instrument>,
    /// The connected user owns the deployed series and its metadata was set
    pub has_permission: bool,
    pub error: Option<String>,
}

impl Default for FlowStatus {
    fn default() -> Self {
        Self {
            state: FlowState::Idle,
            progress: 0.0,
            instrument: None,
            has_permission: false,
            error: None,
        }
    }
}

/// A validated request that has claimed the flow.
///
/// Dropping it before [`CreateFlow::run`] settles the flow moves a running
/// state to `Failed`.
#[derive(Debug)]
pub struct PendingCreate {
    instrument: Instrument,
    params: CreateOptionParams,
    user: Address,
    status: Arc<watch::Sender<FlowStatus>>,
    settled: bool,
}

impl Drop for PendingCreate {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let cancelled = self.status.send_if_modified(|status| {
            if !status.state.is_running() {
                return false;
            }
            status.state = FlowState::Failed;
            status.error = Some(CANCELLED.to_string());
            true
        });
        if cancelled {
            tracing::warn!(name = %self.instrument.name, "Create flow cancelled");
        }
    }
}

pub struct CreateFlow {
    submitter: Arc<dyn TxSubmitter>,
    chain: Arc<dyn ChainReader>,
    status: Arc<watch::Sender<FlowStatus>>,
}

impl CreateFlow {
    pub fn new(submitter: Arc<dyn TxSubmitter>, chain: Arc<dyn ChainReader>) -> Self {
        let (status, _) = watch::channel(FlowStatus::default());
        Self {
            submitter,
            chain,
            status: Arc::new(status),
        }
    }

    pub fn status(&self) -> FlowStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FlowStatus> {
        self.status.subscribe()
    }

    /// Validate `request` and move to `Submitting`.
    ///
    /// Validation failures leave the state untouched. A flow that is still
    /// running rejects the request with [`FlowError::Busy`]; a finished or
    /// failed one is replaced.
    pub fn begin(
        &self,
        request: &CreateRequest,
        user: Option<Address>,
    ) -> Result<PendingCreate, FlowError> {
        let user = user.ok_or_else(|| FlowError::validation(WALLET_REQUIRED))?;
        if !is_valid_strike(request.kind, request.strike_price) {
            return Err(FlowError::validation(INVALID_STRIKE));
        }

        let instrument = Instrument::new(
            request.kind,
            request.style,
            request.strike_price,
            request.expiry,
        );
        let params = instrument
            .create_params()
            .map_err(|e| FlowError::validation(e.to_string()))?;

        let mut claimed = false;
        self.status.send_if_modified(|status| {
            if status.state.is_running() {
                return false;
            }
            *status = FlowStatus {
                state: FlowState::Submitting,
                progress: 0.3,
                instrument: Some(instrument.clone()),
                has_permission: false,
                error: None,
            };
            claimed = true;
            true
        });
        if !claimed {
            return Err(FlowError::Busy);
        }

        tracing::info!(
            name = %instrument.name,
            strike_price = params.strike_price,
            strike_exp = params.strike_exp,
            expiry = params.expiry,
            window = params.window,
            "Creating option series"
        );

        Ok(PendingCreate {
            instrument,
            params,
            user,
            status: Arc::clone(&self.status),
            settled: false,
        })
    }

    /// Drive a claimed request to a terminal state
    pub async fn run(&self, mut pending: PendingCreate) -> Result<FlowStatus, FlowError> {
        let user = pending.user;

        let address = match self.submitter.create_option(&pending.params).await {
            Ok(address) => address,
            Err(e) => {
                pending.settled = true;
                return Err(self.fail(e));
            }
        };
        pending.instrument.address = Some(address);
        let instrument = pending.instrument.clone();
        self.advance(FlowState::AwaitingPermissionCheck, |status| {
            status.instrument = Some(instrument.clone());
        });

        let owner = match self.chain.owner(address).await {
            Ok(owner) => owner,
            Err(e) => {
                pending.settled = true;
                return Err(self.fail(TxError::Read(e)));
            }
        };

        if owner != user {
            tracing::info!(%address, %owner, %user, "Series owned by another account");
            pending.settled = true;
            return Ok(self.advance(FlowState::DoneNoPermission, |status| {
                status.has_permission = false;
            }));
        }

        self.advance(FlowState::SettingDetail, |status| {
            status.has_permission = true;
        });

        let has_permission = match self
            .submitter
            .set_detail(address, &instrument.symbol, &instrument.name)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(%address, error = %e, "Failed to set series details");
                false
            }
        };

        pending.settled = true;
        Ok(self.advance(FlowState::Done, |status| {
            status.has_permission = has_permission;
        }))
    }

    /// Validate, claim and run to completion
    pub async fn create(
        &self,
        request: &CreateRequest,
        user: Option<Address>,
    ) -> Result<FlowStatus, FlowError> {
        let pending = self.begin(request, user)?;
        self.run(pending).await
    }

    /// Validate and claim now, run the transactions in the background.
    ///
    /// Returns the `Submitting` status; follow progress through
    /// [`CreateFlow::subscribe`].
    pub fn spawn(
        self: &Arc<Self>,
        request: &CreateRequest,
        user: Option<Address>,
    ) -> Result<FlowStatus, FlowError> {
        let pending = self.begin(request, user)?;
        let status = self.status();

        let flow = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = flow.run(pending).await {
                tracing::debug!(error = %e, "Create flow ended in failure");
            }
        });

        Ok(status)
    }

    /// Return a finished or failed flow to `Idle`
    pub fn reset(&self) -> Result<(), FlowError> {
        let mut reset = false;
        self.status.send_if_modified(|status| {
            if status.state.is_running() {
                return false;
            }
            reset = status.state != FlowState::Idle;
            *status = FlowStatus::default();
            reset
        });
        if self.status.borrow().state.is_running() {
            return Err(FlowError::Busy);
        }
        Ok(())
    }

    fn advance(&self, state: FlowState, apply: impl FnOnce(&mut FlowStatus)) -> FlowStatus {
        self.status.send_modify(|status| {
            status.state = state;
            if let Some(progress) = state.progress() {
                status.progress = progress;
            }
            apply(status);
        });
        let status = self.status();
        tracing::info!(
            state = ?status.state,
            progress = status.progress,
            has_permission = status.has_permission,
            "Create flow advanced"
        );
        status
    }

    fn fail(&self, error: TxError) -> FlowError {
        tracing::warn!(error = %error, "Create flow failed");
        self.advance(FlowState::Failed, |status| {
            status.error = Some(error.to_string());
        });
        FlowError::Transaction(error)
    }
}
