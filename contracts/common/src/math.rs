//! Fixed-Point Math for the WAI Basket Vault
//!
//! Every quantity is an integer. Products are formed in 256 bits and
//! divided back down with truncation toward zero, so rounding dust always
//! stays with the basket.

use crate::constants::{fees, precision, ratios};
use crate::errors::{WaiError, WaiResult};
use crate::types::{Amount, Price};

pub use bn::U256;

#[allow(clippy::assign_op_pattern)]
#[allow(clippy::ptr_offset_with_cast)]
#[allow(clippy::manual_range_contains)]
mod bn {
    use uint::construct_uint;

    construct_uint! {
        /// 256-bit unsigned integer.
        pub struct U256(4);
    }
}

/// Narrow a 256-bit intermediate back to u128
fn to_u128(value: U256) -> WaiResult<u128> {
    if value > U256::from(u128::MAX) {
        return Err(WaiError::Overflow);
    }
    Ok(value.low_u128())
}

/// Compute `a * b / denominator`, truncating toward zero
pub fn mul_div(a: u128, b: u128, denominator: u128) -> WaiResult<u128> {
    if denominator == 0 {
        return Err(WaiError::DivisionByZero);
    }
    let product = U256::from(a)
        .checked_mul(U256::from(b))
        .ok_or(WaiError::Overflow)?;
    to_u128(product / U256::from(denominator))
}

/// 10^decimals as u128
pub fn pow10(decimals: u8) -> WaiResult<u128> {
    if decimals > precision::MAX_DECIMALS {
        return Err(WaiError::InvalidDecimals {
            decimals,
            maximum: precision::MAX_DECIMALS,
        });
    }
    10u128.checked_pow(decimals as u32).ok_or(WaiError::Overflow)
}

/// Value of `balance` native units in the 18-decimal reference unit
///
/// value = balance * price / 10^decimals
pub fn asset_value(balance: Amount, price: Price, decimals: u8) -> WaiResult<u128> {
    mul_div(balance, price, pow10(decimals)?)
}

/// Native quantity of an asset worth `value`
///
/// quantity = value * 10^decimals / price
pub fn quantity_for_value(value: u128, price: Price, decimals: u8) -> WaiResult<Amount> {
    if price == 0 {
        return Err(WaiError::DivisionByZero);
    }
    mul_div(value, pow10(decimals)?, price)
}

/// Share of `value` in `total` as truncated basis points
pub fn ratio_bps(value: u128, total: u128) -> WaiResult<u64> {
    if total == 0 {
        return Err(WaiError::EmptyBasket);
    }
    let bps = mul_div(value, ratios::BPS_DENOMINATOR as u128, total)?;
    u64::try_from(bps).map_err(|_| WaiError::Overflow)
}

/// Price of one share: total_value * ONE / supply
pub fn price_per_share(total_value: u128, supply: Amount) -> WaiResult<Price> {
    if supply == 0 {
        return Err(WaiError::DivisionByZero);
    }
    mul_div(total_value, precision::ONE, supply)
}

/// Shares bought by `value` at `price_per_share`: value * ONE / pps
pub fn shares_for_value(value: u128, price_per_share: Price) -> WaiResult<Amount> {
    if price_per_share == 0 {
        return Err(WaiError::DivisionByZero);
    }
    mul_div(value, precision::ONE, price_per_share)
}

/// Value redeemed by `shares` at `price_per_share`: shares * pps / ONE
pub fn value_for_shares(shares: Amount, price_per_share: Price) -> WaiResult<u128> {
    mul_div(shares, price_per_share, precision::ONE)
}

/// Fee portion of `amount` at `fee_bps`, truncated
pub fn fee_amount(amount: Amount, fee_bps: u64) -> WaiResult<Amount> {
    if fee_bps > fees::MAX_FEE_BPS {
        return Err(WaiError::InvalidFee { fee_bps });
    }
    mul_div(amount, fee_bps as u128, fees::BPS_DENOMINATOR as u128)
}

/// Split `amount` into `(net, fee)` at `fee_bps`
pub fn split_fee(amount: Amount, fee_bps: u64) -> WaiResult<(Amount, Amount)> {
    let fee = fee_amount(amount, fee_bps)?;
    let net = amount.checked_sub(fee).ok_or(WaiError::Underflow)?;
    Ok((net, fee))
}

/// Checked sum of a sequence of amounts
pub fn checked_sum<I: IntoIterator<Item = u128>>(values: I) -> WaiResult<u128> {
    values
        .into_iter()
        .try_fold(0u128, |acc, v| acc.checked_add(v).ok_or(WaiError::Overflow))
}
