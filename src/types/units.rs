//! Conversions between human-entered amounts and base token units.

use crate::error::SwapError;
use alloy::primitives::{U256, utils::format_units};

/// Parses a human-entered decimal amount into base units of a token.
///
/// Accepts plain decimal notation only. Rejects empty input, signs, exponents, zero, and
/// amounts with more fractional digits than the token supports.
pub fn parse_amount(input: &str, decimals: u8) -> Result<U256, SwapError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(SwapError::InvalidAmount);
    }

    let (whole, frac) = input.split_once('.').unwrap_or((input, ""));
    if (whole.is_empty() && frac.is_empty())
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !frac.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(SwapError::InvalidAmount);
    }
    if frac.len() > decimals as usize {
        return Err(SwapError::AmountPrecision(decimals));
    }

    let mut digits = String::with_capacity(whole.len() + decimals as usize);
    digits.push_str(whole);
    digits.push_str(frac);
    digits.extend(std::iter::repeat_n('0', decimals as usize - frac.len()));

    let amount = U256::from_str_radix(&digits, 10).map_err(|_| SwapError::InvalidAmount)?;
    if amount.is_zero() {
        return Err(SwapError::InvalidAmount);
    }
    Ok(amount)
}

/// Formats base units of a token as a human-readable decimal string.
///
/// Trailing fractional zeros are trimmed, so one whole token formats as `"1"` rather than
/// `"1.000000000000000000"`.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    let formatted = format_units(amount, decimals).unwrap_or_default();
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() }
}

/// Formats `value` truncated to at most `decimals` fractional digits.
///
/// Truncates rather than rounds, so a displayed rate never overstates what a swap returns.
pub fn trim_to_decimals(value: f64, decimals: u32) -> String {
    let factor = 10f64.powi(decimals as i32);
    let truncated = (value * factor).floor() / factor;
    format!("{truncated}")
}

/// Formats a token amount as a USD value with two fractional digits.
pub fn format_amount_to_usd(amount: f64, usd_price: f64) -> String {
    format!("{:.2}", amount * usd_price)
}

/// One whole token in base units.
pub fn whole_unit(decimals: u8) -> U256 {
    U256::from(10u64).pow(U256::from(decimals))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_plain_decimals() {
        assert_eq!(parse_amount("1", 18).unwrap(), U256::from(10u64).pow(U256::from(18u64)));
        assert_eq!(parse_amount("2.5", 6).unwrap(), U256::from(2_500_000u64));
        assert_eq!(parse_amount(".5", 6).unwrap(), U256::from(500_000u64));
        assert_eq!(parse_amount("5.", 6).unwrap(), U256::from(5_000_000u64));
        assert_eq!(parse_amount(" 42 ", 0).unwrap(), U256::from(42u64));
    }

    #[test]
    fn parse_rejects_invalid_input() {
        for input in ["", " ", ".", "-1", "+1", "1e5", "1,5", "abc", "0", "0.0"] {
            assert!(
                matches!(parse_amount(input, 6), Err(SwapError::InvalidAmount)),
                "expected InvalidAmount for {input:?}"
            );
        }
        assert!(matches!(parse_amount("0.0000001", 6), Err(SwapError::AmountPrecision(6))));
    }

    #[test]
    fn format_trims_trailing_zeros() {
        assert_eq!(format_amount(whole_unit(18), 18), "1");
        assert_eq!(format_amount(U256::from(2_500_000u64), 6), "2.5");
        assert_eq!(format_amount(U256::from(1u64), 6), "0.000001");
        assert_eq!(format_amount(U256::ZERO, 6), "0");
    }

    #[test]
    fn trim_truncates_instead_of_rounding() {
        assert_eq!(trim_to_decimals(1.23456789, 6), "1.234567");
        assert_eq!(trim_to_decimals(2.5, 6), "2.5");
        assert_eq!(trim_to_decimals(3.0, 6), "3");
    }

    #[test]
    fn usd_formatting() {
        assert_eq!(format_amount_to_usd(2.0, 1.5), "3.00");
        assert_eq!(format_amount_to_usd(0.0, 45.0), "0.00");
    }
}
