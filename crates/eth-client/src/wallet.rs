//! Wallet-signed transaction submission
//!
//! Every write goes through [`WalletSubmitter::confirm`], which publishes a
//! `submitted` notification carrying the transaction hash as soon as the node
//! accepts the transaction, then waits for the receipt and publishes either
//! `confirmed` or `failed`.

use std::str::FromStr;

use alloy_primitives::{Address, U256};
use alloy_provider::network::{Ethereum, EthereumWallet, Network, ReceiptResponse};
use alloy_provider::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use opyn_core::{
    CreateOptionParams, Error, NodeConfig, TxError, TxNotification, TxNotifier, TxStatus,
    TxSubmitter,
};

use crate::contracts::{IOptionsContract, IOptionsFactory, IERC20};
use crate::parse_rpc_url;

type Receipt = <Ethereum as Network>::ReceiptResponse;

/// Submits protocol transactions from a local signing key
#[derive(Clone)]
pub struct WalletSubmitter {
    provider: DynProvider,
    sender: Address,
    factory: Address,
    notifier: TxNotifier,
}

impl WalletSubmitter {
    /// Build a submitter for `private_key` against the configured node.
    ///
    /// `factory` is the options factory whose `OptionsContractCreated` event
    /// identifies newly deployed series.
    pub fn new(
        node: &NodeConfig,
        private_key: &str,
        factory: Address,
        notifier: TxNotifier,
    ) -> Result<Self, Error> {
        let signer = PrivateKeySigner::from_str(private_key.trim())
            .map_err(|e| Error::Config(format!("invalid private key: {}", e)))?;
        let sender = signer.address();

        let url = parse_rpc_url(&node.rpc_url)?;
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();

        tracing::info!(%sender, "Wallet submitter ready");

        Ok(Self {
            provider,
            sender,
            factory,
            notifier,
        })
    }

    /// Notification channel this submitter publishes to
    pub fn notifier(&self) -> &TxNotifier {
        &self.notifier
    }

    /// Publish the hash, wait for the receipt and publish the outcome.
    async fn confirm(
        &self,
        operation: &'static str,
        description: &str,
        pending: PendingTransactionBuilder<Ethereum>,
    ) -> Result<Receipt, TxError> {
        let tx_hash = *pending.tx_hash();
        tracing::info!(operation, %tx_hash, "Transaction submitted");
        self.notifier.notify(TxNotification::new(
            TxStatus::Submitted,
            operation,
            description,
            Some(tx_hash),
        ));

        let receipt = match pending.get_receipt().await {
            Ok(receipt) => receipt,
            Err(e) => {
                tracing::warn!(operation, %tx_hash, error = %e, "Failed to get receipt");
                self.notifier.notify(TxNotification::new(
                    TxStatus::Failed,
                    operation,
                    description,
                    Some(tx_hash),
                ));
                return Err(TxError::ReceiptFailed {
                    message: e.to_string(),
                });
            }
        };

        if !receipt.status() {
            tracing::warn!(operation, %tx_hash, "Transaction reverted");
            self.notifier.notify(TxNotification::new(
                TxStatus::Failed,
                operation,
                description,
                Some(tx_hash),
            ));
            return Err(TxError::Reverted {
                tx_hash: tx_hash.to_string(),
            });
        }

        tracing::info!(operation, %tx_hash, "Transaction confirmed");
        self.notifier.notify(TxNotification::new(
            TxStatus::Confirmed,
            operation,
            description,
            Some(tx_hash),
        ));
        Ok(receipt)
    }

    fn submission_failed(
        &self,
        operation: &'static str,
        description: &str,
        error: impl std::fmt::Display,
    ) -> TxError {
        tracing::warn!(operation, error = %error, "Transaction submission failed");
        self.notifier.notify(TxNotification::new(
            TxStatus::Failed,
            operation,
            description,
            None,
        ));
        TxError::SubmissionFailed {
            message: error.to_string(),
        }
    }

    /// Address announced by the factory in a creation receipt
    fn deployed_address(&self, receipt: &Receipt) -> Option<Address> {
        receipt
            .inner
            .logs()
            .iter()
            .filter(|log| log.address() == self.factory)
            .find_map(|log| IOptionsFactory::OptionsContractCreated::decode_log_data(log.data()).ok())
            .map(|event| event.addr)
    }
}

#[async_trait]
impl TxSubmitter for WalletSubmitter {
    fn sender(&self) -> Option<Address> {
        Some(self.sender)
    }

    async fn create_option(&self, params: &CreateOptionParams) -> Result<Address, TxError> {
        const OPERATION: &str = "create_option";
        let description = format!(
            "Create {} / {} option, strike {}e{}",
            params.collateral, params.underlying, params.strike_price, params.strike_exp
        );

        let factory = IOptionsFactory::new(self.factory, &self.provider);
        let call = factory.createOptionsContract(
            params.collateral.clone(),
            params.collateral_exp,
            params.underlying.clone(),
            params.underlying_exp,
            params.decimals_exp,
            U256::from(params.strike_price),
            params.strike_exp,
            params.strike_asset.clone(),
            U256::from(params.expiry),
            U256::from(params.window),
        );
        let pending = call
            .send()
            .await
            .map_err(|e| self.submission_failed(OPERATION, &description, e))?;

        let receipt = self.confirm(OPERATION, &description, pending).await?;

        self.deployed_address(&receipt)
            .ok_or_else(|| TxError::MissingDeployment {
                tx_hash: receipt.transaction_hash.to_string(),
            })
    }

    async fn set_detail(
        &self,
        contract: Address,
        symbol: &str,
        name: &str,
    ) -> Result<(), TxError> {
        const OPERATION: &str = "set_detail";
        let description = format!("Set details of {}: {}", contract, symbol);

        let option = IOptionsContract::new(contract, &self.provider);
        let call = option.setDetails(name.to_string(), symbol.to_string());
        let pending = call
            .send()
            .await
            .map_err(|e| self.submission_failed(OPERATION, &description, e))?;

        self.confirm(OPERATION, &description, pending).await?;
        Ok(())
    }

    async fn approve(&self, asset: Address, spender: Address) -> Result<(), TxError> {
        const OPERATION: &str = "approve";
        let description = format!("Approve {} for {}", asset, spender);

        let token = IERC20::new(asset, &self.provider);
        let call = token.approve(spender, U256::MAX);
        let pending = call
            .send()
            .await
            .map_err(|e| self.submission_failed(OPERATION, &description, e))?;

        self.confirm(OPERATION, &description, pending).await?;
        Ok(())
    }

    async fn liquidate(
        &self,
        contract: Address,
        owner: Address,
        amount: U256,
    ) -> Result<(), TxError> {
        const OPERATION: &str = "liquidate";
        let description = format!("Liquidate {} of vault {} on {}", amount, owner, contract);

        let option = IOptionsContract::new(contract, &self.provider);
        let call = option.liquidate(owner, amount);
        let pending = call
            .send()
            .await
            .map_err(|e| self.submission_failed(OPERATION, &description, e))?;

        self.confirm(OPERATION, &description, pending).await?;
        Ok(())
    }

    async fn add_eth_collateral(
        &self,
        contract: Address,
        owner: Address,
        amount: U256,
    ) -> Result<(), TxError> {
        const OPERATION: &str = "add_eth_collateral";
        let description = format!("Add {} wei collateral to vault {} on {}", amount, owner, contract);

        let option = IOptionsContract::new(contract, &self.provider);
        let call = option.addETHCollateral(owner).value(amount);
        let pending = call
            .send()
            .await
            .map_err(|e| self.submission_failed(OPERATION, &description, e))?;

        self.confirm(OPERATION, &description, pending).await?;
        Ok(())
    }
}
