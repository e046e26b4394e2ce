//! Option series construction and factory call parameters
//!
//! A put is collateralized in USDC and protects ETH; a call is collateralized
//! in ETH and protects USDC. The factory takes the strike as an integer plus
//! an exponent, which is why the two kinds encode the USD strike differently.

use chrono::{DateTime, Utc};
use opyn_core::{CreateOptionParams, ExerciseStyle, OptionKind, ProtocolError};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::constants::{
    self, CALL_STRIKE_EXP, CALL_STRIKE_NUMERATOR, DECIMALS_EXP, EUROPEAN_WINDOW_OFFSET_SECS,
    PUT_STRIKE_DIVISOR, PUT_STRIKE_EXP,
};
use crate::state::Instrument;

/// Encode a USD strike as the factory's `(strikePrice, strikeExp)` pair.
///
/// - put: `trunc(strike / 10)`, exponent -6
/// - call: `trunc(10_000_000 / strike)`, exponent -14
pub fn encode_strike(kind: OptionKind, strike: Decimal) -> Result<(u64, i32), ProtocolError> {
    if strike <= Decimal::ZERO {
        return Err(ProtocolError::InvalidStrike {
            message: format!("strike must be positive, got {}", strike),
        });
    }

    let (encoded, exp) = match kind {
        OptionKind::Put => (
            strike.checked_div(Decimal::from(PUT_STRIKE_DIVISOR)),
            PUT_STRIKE_EXP,
        ),
        OptionKind::Call => (
            Decimal::from(CALL_STRIKE_NUMERATOR).checked_div(strike),
            CALL_STRIKE_EXP,
        ),
    };

    let encoded = encoded
        .and_then(|v| v.trunc().to_u64())
        .filter(|v| *v > 0)
        .ok_or_else(|| ProtocolError::InvalidStrike {
            message: format!("{} strike {} encodes to zero", kind, strike),
        })?;

    Ok((encoded, exp))
}

/// Whether a strike can be turned into a series of the given kind
pub fn is_valid_strike(kind: OptionKind, strike: Decimal) -> bool {
    encode_strike(kind, strike).is_ok()
}

/// Last second the option can be exercised
pub fn exercise_window(expiry_secs: u64, style: ExerciseStyle) -> u64 {
    match style {
        ExerciseStyle::American => expiry_secs,
        ExerciseStyle::European => expiry_secs.saturating_sub(EUROPEAN_WINDOW_OFFSET_SECS),
    }
}

/// Expiry date as `dd/mm/yy`
pub fn format_expiry_date(expiry: DateTime<Utc>) -> String {
    expiry.format("%d/%m/%y").to_string()
}

/// `Opyn ETH Put $100 25/12/20`
pub fn option_name(kind: OptionKind, strike: Decimal, expiry: DateTime<Utc>) -> String {
    format!(
        "Opyn ETH {} ${} {}",
        kind.label(),
        strike.normalize(),
        format_expiry_date(expiry)
    )
}

/// `oETH $100 Put 25/12/20`
pub fn option_symbol(kind: OptionKind, strike: Decimal, expiry: DateTime<Utc>) -> String {
    format!(
        "oETH ${} {} {}",
        strike.normalize(),
        kind.label(),
        format_expiry_date(expiry)
    )
}

impl Instrument {
    /// Build an undeployed ETH option series from user input
    pub fn new(
        kind: OptionKind,
        style: ExerciseStyle,
        strike_price: Decimal,
        expiry: DateTime<Utc>,
    ) -> Self {
        let (collateral, underlying, strike_asset) = match kind {
            OptionKind::Put => (constants::usdc(), constants::eth(), constants::usdc()),
            OptionKind::Call => (constants::eth(), constants::usdc(), constants::eth()),
        };

        Self {
            kind,
            style,
            strike_price,
            expiry,
            collateral,
            underlying,
            strike_asset,
            name: option_name(kind, strike_price, expiry),
            symbol: option_symbol(kind, strike_price, expiry),
            address: None,
        }
    }

    /// Expiry as whole seconds since epoch
    pub fn expiry_secs(&self) -> Result<u64, ProtocolError> {
        u64::try_from(self.expiry.timestamp()).map_err(|_| ProtocolError::InvalidAmount {
            message: format!("expiry {} is before the epoch", self.expiry),
        })
    }

    /// Arguments of the factory's `createOptionsContract` for this series
    pub fn create_params(&self) -> Result<CreateOptionParams, ProtocolError> {
        let (strike_price, strike_exp) = encode_strike(self.kind, self.strike_price)?;
        let expiry = self.expiry_secs()?;

        Ok(CreateOptionParams {
            collateral: self.collateral.symbol.clone(),
            collateral_exp: self.collateral.exponent(),
            underlying: self.underlying.symbol.clone(),
            underlying_exp: self.underlying.exponent(),
            decimals_exp: DECIMALS_EXP,
            strike_price,
            strike_exp,
            strike_asset: self.strike_asset.symbol.clone(),
            expiry,
            window: exercise_window(expiry, self.style),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_put_strike_encoding() {
        assert_eq!(encode_strike(OptionKind::Put, dec!(100)).unwrap(), (10, -6));
        assert_eq!(encode_strike(OptionKind::Put, dec!(155)).unwrap(), (15, -6));
    }

    #[test]
    fn test_call_strike_encoding() {
        assert_eq!(encode_strike(OptionKind::Call, dec!(200)).unwrap(), (50_000, -14));
        assert_eq!(encode_strike(OptionKind::Call, dec!(300)).unwrap(), (33_333, -14));
    }

    #[test]
    fn test_invalid_strikes() {
        assert!(encode_strike(OptionKind::Put, dec!(0)).is_err());
        assert!(encode_strike(OptionKind::Call, dec!(-5)).is_err());
        // truncates to zero
        assert!(!is_valid_strike(OptionKind::Put, dec!(9.99)));
        assert!(!is_valid_strike(OptionKind::Call, dec!(20000000)));
        assert!(is_valid_strike(OptionKind::Put, dec!(10)));
    }

    #[test]
    fn test_exercise_window() {
        assert_eq!(exercise_window(1_700_000_000, ExerciseStyle::European), 1_699_913_600);
        assert_eq!(exercise_window(1_700_000_000, ExerciseStyle::American), 1_700_000_000);
    }

    #[test]
    fn test_name_and_symbol() {
        let expiry = Utc.with_ymd_and_hms(2020, 12, 25, 8, 0, 0).unwrap();
        assert_eq!(
            option_name(OptionKind::Put, dec!(100), expiry),
            "Opyn ETH Put $100 25/12/20"
        );
        assert_eq!(
            option_symbol(OptionKind::Call, dec!(250.50), expiry),
            "oETH $250.5 Call 25/12/20"
        );
    }

    #[test]
    fn test_put_create_params() {
        let expiry = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let put = Instrument::new(OptionKind::Put, ExerciseStyle::European, dec!(100), expiry);
        let params = put.create_params().unwrap();

        assert_eq!(params.collateral, "USDC");
        assert_eq!(params.collateral_exp, -6);
        assert_eq!(params.underlying, "ETH");
        assert_eq!(params.underlying_exp, -18);
        assert_eq!(params.decimals_exp, -7);
        assert_eq!(params.strike_price, 10);
        assert_eq!(params.strike_exp, -6);
        assert_eq!(params.strike_asset, "USDC");
        assert_eq!(params.expiry, 1_700_000_000);
        assert_eq!(params.window, 1_699_913_600);
        assert!(put.address.is_none());
    }

    #[test]
    fn test_call_create_params() {
        let expiry = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let call = Instrument::new(OptionKind::Call, ExerciseStyle::American, dec!(200), expiry);
        let params = call.create_params().unwrap();

        assert_eq!(params.collateral, "ETH");
        assert_eq!(params.collateral_exp, -18);
        assert_eq!(params.underlying, "USDC");
        assert_eq!(params.underlying_exp, -6);
        assert_eq!(params.strike_price, 50_000);
        assert_eq!(params.strike_exp, -14);
        assert_eq!(params.strike_asset, "ETH");
        assert_eq!(params.window, 1_700_000_000);
    }

    #[test]
    fn test_sub_second_expiry_truncates() {
        let expiry = Utc.timestamp_millis_opt(1_700_000_000_999).unwrap();
        let put = Instrument::new(OptionKind::Put, ExerciseStyle::American, dec!(100), expiry);
        assert_eq!(put.expiry_secs().unwrap(), 1_700_000_000);
    }
}
