//! Contract bindings for the Opyn v1 options protocol and ERC-20 tokens

use alloy_sol_types::sol;

sol! {
    #[sol(rpc)]
    contract IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

sol! {
    #[sol(rpc)]
    contract IOptionsFactory {
        event OptionsContractCreated(address addr);

        function createOptionsContract(
            string _collateralType,
            int32 _collateralExp,
            string _underlyingType,
            int32 _underlyingExp,
            int32 _oTokenExchangeExp,
            uint256 _strikePrice,
            int32 _strikeExp,
            string _strikeAsset,
            uint256 _expiry,
            uint256 _windowSize
        ) external returns (address);
    }
}

sol! {
    #[sol(rpc)]
    contract IOptionsContract {
        function owner() external view returns (address);
        function strike() external view returns (address);
        function decimals() external view returns (uint8);
        function COMPOUND_ORACLE() external view returns (address);
        function minCollateralizationRatio() external view returns (uint256 value, int32 exponent);
        function strikePrice() external view returns (uint256 value, int32 exponent);
        function getVault(address vaultOwner)
            external
            view
            returns (uint256 collateral, uint256 oTokensIssued, uint256 underlying, bool owned);
        function isUnsafe(address vaultOwner) external view returns (bool);

        function setDetails(string _name, string _symbol) external;
        function liquidate(address vaultOwner, uint256 oTokensToLiquidate) external;
        function addETHCollateral(address vaultOwner) external payable returns (uint256);
    }
}

sol! {
    #[sol(rpc)]
    contract IOracle {
        function getPrice(address asset) external view returns (uint256);
    }
}
