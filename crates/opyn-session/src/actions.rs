//! One-shot wallet actions: token approval, liquidation, adding collateral

use std::str::FromStr;
use std::sync::Arc;

use opyn_core::{Address, ProtocolError, TxSubmitter, U256};
use rust_decimal::Decimal;

use crate::errors::FlowError;

const WEI_DECIMALS: u32 = 18;

/// Convert a decimal ETH amount such as `"0.5"` to wei
pub fn eth_to_wei(amount: &str) -> Result<U256, ProtocolError> {
    let invalid = |message: String| ProtocolError::InvalidAmount { message };

    let value = Decimal::from_str(amount.trim())
        .map_err(|e| invalid(format!("'{}' is not a number: {}", amount, e)))?
        .normalize();
    if value <= Decimal::ZERO {
        return Err(invalid(format!("amount must be positive, got {}", amount)));
    }
    if value.scale() > WEI_DECIMALS {
        return Err(invalid(format!(
            "'{}' has more than {} decimals",
            amount, WEI_DECIMALS
        )));
    }

    let mantissa = u128::try_from(value.mantissa())
        .map_err(|_| invalid(format!("amount out of range: {}", amount)))?;
    let scale = U256::from(10u64).pow(U256::from(WEI_DECIMALS - value.scale()));
    Ok(U256::from(mantissa) * scale)
}

pub struct Actions {
    submitter: Arc<dyn TxSubmitter>,
    erc20_proxy: Address,
}

impl Actions {
    pub fn new(submitter: Arc<dyn TxSubmitter>, erc20_proxy: Address) -> Self {
        Self {
            submitter,
            erc20_proxy,
        }
    }

    fn require_wallet(user: Option<Address>) -> Result<Address, FlowError> {
        user.ok_or(FlowError::Protocol(ProtocolError::WalletNotConnected))
    }

    /// Let the 0x ERC-20 proxy move `asset` (option token or WETH)
    pub async fn approve(&self, user: Option<Address>, asset: Address) -> Result<(), FlowError> {
        let user = Self::require_wallet(user)?;
        tracing::info!(%user, %asset, spender = %self.erc20_proxy, "Approving token");
        self.submitter.approve(asset, self.erc20_proxy).await?;
        Ok(())
    }

    /// Liquidate `amount` oTokens of the vault of `owner`
    pub async fn liquidate(
        &self,
        user: Option<Address>,
        option: Address,
        owner: Address,
        amount: U256,
    ) -> Result<(), FlowError> {
        let user = Self::require_wallet(user)?;
        if amount.is_zero() {
            return Err(ProtocolError::InvalidAmount {
                message: "liquidation amount must be positive".into(),
            }
            .into());
        }
        tracing::info!(%user, %option, %owner, %amount, "Liquidating vault");
        self.submitter.liquidate(option, owner, amount).await?;
        Ok(())
    }

    /// Add `eth_amount` ETH of collateral to the vault of `owner`
    pub async fn add_eth_collateral(
        &self,
        user: Option<Address>,
        option: Address,
        owner: Address,
        eth_amount: &str,
    ) -> Result<U256, FlowError> {
        let user = Self::require_wallet(user)?;
        let wei = eth_to_wei(eth_amount)?;
        tracing::info!(%user, %option, %owner, %wei, "Adding ETH collateral");
        self.submitter.add_eth_collateral(option, owner, wei).await?;
        Ok(wei)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fakes;

    fn actions(fakes: &Fakes) -> Actions {
        Actions::new(fakes.submitter.clone(), Address::repeat_byte(0x95))
    }

    #[test]
    fn test_eth_to_wei() {
        assert_eq!(
            eth_to_wei("1").unwrap(),
            U256::from(1_000_000_000_000_000_000u128)
        );
        assert_eq!(
            eth_to_wei("0.5").unwrap(),
            U256::from(500_000_000_000_000_000u128)
        );
        assert_eq!(eth_to_wei(" 0.000000000000000001 ").unwrap(), U256::from(1u64));
        assert_eq!(
            eth_to_wei("2.50").unwrap(),
            U256::from(2_500_000_000_000_000_000u128)
        );
    }

    #[test]
    fn test_eth_to_wei_rejects() {
        assert!(eth_to_wei("0").is_err());
        assert!(eth_to_wei("-1").is_err());
        assert!(eth_to_wei("abc").is_err());
        assert!(eth_to_wei("0.0000000000000000001").is_err());
    }

    #[tokio::test]
    async fn test_approve_targets_proxy() {
        let fakes = Fakes::default();
        let weth = Address::repeat_byte(0xee);
        actions(&fakes).approve(Some(fakes.user()), weth).await.unwrap();
        assert_eq!(
            fakes.submitter.approvals(),
            vec![(weth, Address::repeat_byte(0x95))]
        );
    }

    #[tokio::test]
    async fn test_actions_require_wallet() {
        let fakes = Fakes::default();
        let err = actions(&fakes)
            .approve(None, Address::ZERO)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert!(fakes.submitter.approvals().is_empty());
    }

    #[tokio::test]
    async fn test_liquidate_and_add_collateral() {
        let fakes = Fakes::default();
        let actions = actions(&fakes);
        let option = Address::repeat_byte(0x42);
        let owner = Address::repeat_byte(0x01);

        actions
            .liquidate(Some(fakes.user()), option, owner, U256::from(10u64))
            .await
            .unwrap();
        assert!(actions
            .liquidate(Some(fakes.user()), option, owner, U256::ZERO)
            .await
            .is_err());
        assert_eq!(
            fakes.submitter.liquidations(),
            vec![(option, owner, U256::from(10u64))]
        );

        let wei = actions
            .add_eth_collateral(Some(fakes.user()), option, owner, "0.25")
            .await
            .unwrap();
        assert_eq!(wei, U256::from(250_000_000_000_000_000u128));
        assert_eq!(fakes.submitter.collateral(), vec![(option, owner, wei)]);
    }
}
