//! Chain read queries against the options protocol contracts

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use futures::future::try_join_all;
use opyn_core::{ChainReader, OptionDetail, SourceError, VaultRaw};

use crate::contracts::{IOptionsContract, IOracle, IERC20};
use crate::{timed_request, EthClient};

#[async_trait]
impl ChainReader for EthClient {
    async fn balance_of(&self, asset: Address, user: Address) -> Result<U256, SourceError> {
        let token = IERC20::new(asset, self.provider());
        timed_request(token.balanceOf(user).call()).await
    }

    async fn owner(&self, contract: Address) -> Result<Address, SourceError> {
        let option = IOptionsContract::new(contract, self.provider());
        timed_request(option.owner().call()).await
    }

    async fn option_detail(&self, contract: Address) -> Result<OptionDetail, SourceError> {
        let option = IOptionsContract::new(contract, self.provider());

        let strike_call = option.strike();
        let decimals_call = option.decimals();
        let ratio_call = option.minCollateralizationRatio();
        let strike_price_call = option.strikePrice();
        let oracle_call = option.COMPOUND_ORACLE();

        let (strike_asset, decimals, min_ratio, strike_price, oracle) = tokio::try_join!(
            timed_request(strike_call.call()),
            timed_request(decimals_call.call()),
            timed_request(ratio_call.call()),
            timed_request(strike_price_call.call()),
            timed_request(oracle_call.call()),
        )?;

        Ok(OptionDetail {
            strike_asset,
            decimals,
            min_ratio: scaled(min_ratio.value, min_ratio.exponent),
            strike_price: scaled(strike_price.value, strike_price.exponent),
            oracle,
        })
    }

    async fn vaults(
        &self,
        owners: &[Address],
        contract: Address,
    ) -> Result<Vec<VaultRaw>, SourceError> {
        let option = IOptionsContract::new(contract, self.provider());

        let reads = owners.iter().map(|owner| {
            let option = &option;
            async move {
                let vault = timed_request(option.getVault(*owner).call()).await?;
                Ok::<_, SourceError>((*owner, vault))
            }
        });

        let vaults = try_join_all(reads).await?;

        Ok(vaults
            .into_iter()
            .filter(|(_, vault)| vault.owned)
            .map(|(owner, vault)| VaultRaw {
                owner,
                collateral: vault.collateral,
                options_issued: vault.oTokensIssued,
                underlying: vault.underlying,
            })
            .collect())
    }

    async fn price(&self, oracle: Address, asset: Address) -> Result<U256, SourceError> {
        let oracle = IOracle::new(oracle, self.provider());
        timed_request(oracle.getPrice(asset).call()).await
    }

    async fn is_unsafe(&self, contract: Address, owner: Address) -> Result<bool, SourceError> {
        let option = IOptionsContract::new(contract, self.provider());
        timed_request(option.isUnsafe(owner).call()).await
    }
}

/// `value * 10^exponent` as a float, the protocol's `Number` representation
fn scaled(value: U256, exponent: i32) -> f64 {
    let value: f64 = value.to_string().parse().unwrap_or(0.0);
    value * 10f64.powi(exponent)
}
