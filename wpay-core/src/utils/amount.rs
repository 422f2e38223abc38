//! Amount formatting and base-unit encoding.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount must not be negative: {0}")]
    Negative(Decimal),
    #[error("amount {amount} does not fit into {decimals} decimals")]
    Overflow { amount: Decimal, decimals: u8 },
}

/// Encode `amount` in the asset's smallest unit as a `0x`-prefixed hex string.
///
/// Sub-unit fractions are truncated.
pub fn to_base_units_hex(amount: Decimal, decimals: u8) -> Result<String, AmountError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AmountError::Negative(amount));
    }
    let overflow = || AmountError::Overflow { amount, decimals };
    let factor = 10i128
        .checked_pow(u32::from(decimals))
        .and_then(|f| Decimal::try_from_i128_with_scale(f, 0).ok())
        .ok_or_else(overflow)?;
    let units = amount
        .checked_mul(factor)
        .ok_or_else(overflow)?
        .trunc()
        .to_u128()
        .ok_or_else(overflow)?;
    Ok(format!("{units:#x}"))
}

/// Round half away from zero to `dp` places and render with exactly `dp`
/// fraction digits and `,` thousands separators.
pub fn format_fixed(amount: Decimal, dp: u32) -> String {
    let mut rounded = amount.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    let text = rounded.abs().to_string();
    let (integer, fraction) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(text.len() + integer.len() / 3 + 1);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        grouped.push('-');
    }
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    grouped
}

/// `0.050000 ETH`, `12.50 USDC`.
///
/// ETH is shown with 6 fraction digits, everything else with 2.
pub fn format_crypto_amount(amount: Decimal, symbol: &str) -> String {
    let dp = if symbol.eq_ignore_ascii_case("ETH") { 6 } else { 2 };
    format!("{} {}", format_fixed(amount, dp), symbol)
}

/// `$1,234.50`
pub fn format_usd(amount: Decimal) -> String {
    let text = format_fixed(amount, 2);
    match text.strip_prefix('-') {
        Some(rest) => format!("-${rest}"),
        None => format!("${text}"),
    }
}
