//! Vault health and order validity calculations

use opyn_core::{OptionDetail, Order, VaultRaw, U256};

use crate::constants::{ISSUED_DECIMALS, RATIO_DECIMALS};
use crate::state::VaultView;

/// Lossy conversion for display math
pub fn u256_to_f64(value: U256) -> f64 {
    value.to_string().parse().unwrap_or(0.0)
}

/// Round to a fixed number of decimals
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// An order is fillable when it has taker amount left and does not expire
/// within `buffer_secs` of `now_secs`.
pub fn is_valid_order(order: &Order, now_secs: u64, buffer_secs: u64) -> bool {
    order.remaining_fillable_taker_amount > U256::ZERO
        && order.expiration_time_seconds > now_secs.saturating_add(buffer_secs)
}

/// Keep only valid orders, preserving relay order
pub fn filter_valid_orders(orders: Vec<Order>, now_secs: u64, buffer_secs: u64) -> Vec<Order> {
    orders
        .into_iter()
        .filter(|order| is_valid_order(order, now_secs, buffer_secs))
        .collect()
}

/// Collateral value over protected value.
///
/// `eth_value_in_strike` is `1 / oracle price` of the strike asset. Returns
/// `None` when nothing is protected (no options issued).
pub fn vault_ratio(
    collateral: U256,
    options_issued: U256,
    strike_price: f64,
    eth_value_in_strike: f64,
) -> Option<f64> {
    let value_protecting = strike_price * u256_to_f64(options_issued);
    if value_protecting == 0.0 || !value_protecting.is_finite() {
        return None;
    }
    let ratio = u256_to_f64(collateral) * eth_value_in_strike / value_protecting;
    ratio.is_finite().then(|| round_to(ratio, RATIO_DECIMALS))
}

/// Derive the health of every vault from one tick's raw data.
///
/// `liquidatable` is indexed like `vaults`; missing entries count as not
/// liquidatable.
pub fn derive_vault_views(
    vaults: &[VaultRaw],
    detail: &OptionDetail,
    strike_price_in_wei: U256,
    liquidatable: &[bool],
) -> Vec<VaultView> {
    let price = u256_to_f64(strike_price_in_wei);
    let eth_value_in_strike = if price > 0.0 { 1.0 / price } else { 0.0 };
    let scale = 10f64.powi(i32::from(detail.decimals));

    vaults
        .iter()
        .enumerate()
        .map(|(i, vault)| {
            let ratio = vault_ratio(
                vault.collateral,
                vault.options_issued,
                detail.strike_price,
                eth_value_in_strike,
            );
            VaultView {
                owner: vault.owner,
                collateral: vault.collateral,
                options_issued_raw: vault.options_issued,
                options_issued: round_to(u256_to_f64(vault.options_issued) / scale, ISSUED_DECIMALS),
                ratio,
                is_safe: ratio.map_or(true, |r| r > detail.min_ratio),
                is_liquidatable: liquidatable.get(i).copied().unwrap_or(false),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use opyn_core::Address;

    fn order(remaining: u64, expires: u64) -> Order {
        Order {
            order_hash: format!("0x{:x}", expires),
            maker_address: Address::ZERO,
            taker_address: Address::ZERO,
            fee_recipient_address: Address::ZERO,
            sender_address: Address::ZERO,
            maker_asset_amount: U256::from(1u64),
            taker_asset_amount: U256::from(1u64),
            maker_fee: U256::ZERO,
            taker_fee: U256::ZERO,
            maker_asset_data: String::new(),
            taker_asset_data: String::new(),
            expiration_time_seconds: expires,
            salt: "1".into(),
            exchange_address: Address::ZERO,
            chain_id: 1,
            signature: "0x".into(),
            remaining_fillable_taker_amount: U256::from(remaining),
        }
    }

    fn detail(min_ratio: f64, strike_price: f64) -> OptionDetail {
        OptionDetail {
            strike_asset: Address::ZERO,
            decimals: 7,
            min_ratio,
            strike_price,
            oracle: Address::ZERO,
        }
    }

    #[test]
    fn test_order_validity() {
        let now = 1_000_000;
        assert!(is_valid_order(&order(5, now + 61), now, 60));
        // expires inside the buffer
        assert!(!is_valid_order(&order(5, now + 60), now, 60));
        // fully filled
        assert!(!is_valid_order(&order(0, now + 3600), now, 60));
    }

    #[test]
    fn test_filter_preserves_order() {
        let now = 1_000;
        let orders = vec![order(1, 5_000), order(0, 5_000), order(1, 900), order(2, 6_000)];
        let valid = filter_valid_orders(orders, now, 60);
        assert_eq!(valid.len(), 2);
        assert_eq!(valid[0].expiration_time_seconds, 5_000);
        assert_eq!(valid[1].expiration_time_seconds, 6_000);
    }

    #[test]
    fn test_vault_ratio() {
        // 1000 collateral, price 2 -> 500 in strike; protecting 2.5 * 100 = 250
        let ratio = vault_ratio(U256::from(1000u64), U256::from(100u64), 2.5, 0.5).unwrap();
        assert!((ratio - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_vault_ratio_nothing_issued() {
        assert_eq!(vault_ratio(U256::from(1000u64), U256::ZERO, 2.5, 0.5), None);
    }

    #[test]
    fn test_ratio_rounded_to_four_decimals() {
        let ratio = vault_ratio(U256::from(1u64), U256::from(3u64), 1.0, 1.0).unwrap();
        assert_eq!(ratio, 0.3333);
    }

    #[test]
    fn test_derive_vault_views() {
        let owner_a = Address::repeat_byte(0xaa);
        let owner_b = Address::repeat_byte(0xbb);
        let owner_c = Address::repeat_byte(0xcc);
        let vaults = vec![
            VaultRaw {
                owner: owner_a,
                collateral: U256::from(4_000u64),
                options_issued: U256::from(10_000_000u64),
                underlying: U256::ZERO,
            },
            VaultRaw {
                owner: owner_b,
                collateral: U256::from(1_000u64),
                options_issued: U256::from(10_000_000u64),
                underlying: U256::ZERO,
            },
            VaultRaw {
                owner: owner_c,
                collateral: U256::from(1_000u64),
                options_issued: U256::ZERO,
                underlying: U256::ZERO,
            },
        ];

        // price 1 -> eth_value_in_strike 1; protecting 1e-4 * 1e7 = 1000
        let views = derive_vault_views(
            &vaults,
            &detail(1.6, 0.0001),
            U256::from(1u64),
            &[false, true],
        );

        assert_eq!(views.len(), 3);
        assert_eq!(views[0].ratio, Some(4.0));
        assert!(views[0].is_safe);
        assert!(!views[0].is_liquidatable);
        assert_eq!(views[0].options_issued, 1.0);

        assert_eq!(views[1].ratio, Some(1.0));
        assert!(!views[1].is_safe);
        assert!(views[1].is_liquidatable);

        assert_eq!(views[2].ratio, None);
        assert!(views[2].is_safe);
        assert!(!views[2].is_liquidatable);
    }

    #[test]
    fn test_zero_price_gives_zero_ratio() {
        let vaults = vec![VaultRaw {
            owner: Address::ZERO,
            collateral: U256::from(1u64),
            options_issued: U256::from(1u64),
            underlying: U256::ZERO,
        }];
        let views = derive_vault_views(&vaults, &detail(1.0, 1.0), U256::ZERO, &[]);
        assert_eq!(views[0].ratio, Some(0.0));
        assert!(!views[0].is_safe);
    }
}
