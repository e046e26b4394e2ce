//! Protocol constants for ETH/USDC option series

use opyn_core::constants::{ETH_DECIMALS, USDC_ADDRESS, USDC_DECIMALS};
use opyn_core::{Address, Asset};

/// oToken exchange exponent of every ETH option series
pub const DECIMALS_EXP: i32 = -7;

/// Strike exponent of a put (strike asset USDC)
pub const PUT_STRIKE_EXP: i32 = -6;

/// Puts encode the USD strike divided by this
pub const PUT_STRIKE_DIVISOR: u64 = 10;

/// Strike exponent of a call (strike asset ETH)
pub const CALL_STRIKE_EXP: i32 = -14;

/// Calls encode this divided by the USD strike
pub const CALL_STRIKE_NUMERATOR: u64 = 10_000_000;

/// European options stop exercising this long before expiry
pub const EUROPEAN_WINDOW_OFFSET_SECS: u64 = opyn_core::constants::SECONDS_PER_DAY;

/// Vault ratios are reported with this many decimals
pub const RATIO_DECIMALS: i32 = 4;

/// Issued oToken amounts are reported with this many decimals
pub const ISSUED_DECIMALS: i32 = 4;

/// USDC as the factory sees it
pub fn usdc() -> Asset {
    Asset::new("USDC", USDC_ADDRESS, USDC_DECIMALS)
}

/// Native ETH as the factory sees it
pub fn eth() -> Asset {
    Asset::new("ETH", Address::ZERO, ETH_DECIMALS)
}
