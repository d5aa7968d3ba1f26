//! Currency-aware, invariant-locale decimal parsing.
//!
//! Handles the conventions common to mainframe-rendered currency fields:
//! parenthesised negatives, a leading currency symbol, and thousands
//! commas. Uses [`rust_decimal`] rather than floating point so that
//! `"$1,234.56"` round-trips exactly.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

const CURRENCY_SYMBOLS: &[char] = &['$', '£', '€'];

/// Parse a currency-formatted string into a [`Decimal`].
///
/// Recognises:
/// - surrounding whitespace (trimmed)
/// - outer parentheses as a negative sign, e.g. `"(1,234.56)"` → `-1234.56`
/// - a leading `$`, `£`, or `€` symbol
/// - thousands commas
///
/// Returns `None` for empty input or anything that does not parse as a
/// decimal once the above conventions are stripped — never panics.
#[must_use]
pub fn parse_decimal(input: &str) -> Option<Decimal> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (negative, body) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner.trim()),
        None => (false, trimmed),
    };

    let body = body.trim_start_matches(|c| CURRENCY_SYMBOLS.contains(&c));
    let cleaned: String = body.chars().filter(|c| *c != ',').collect();

    if cleaned.is_empty() {
        return None;
    }

    let magnitude = Decimal::from_str(&cleaned).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Round `value` to `decimal_places` using banker's rounding
/// (round-half-to-even), the convention used whenever a screen field's
/// format specifies fewer decimal places than the exact arithmetic result.
#[must_use]
pub fn round_banker(value: Decimal, decimal_places: u32) -> Decimal {
    value.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parenthesised_negative() {
        assert_eq!(parse_decimal("(1,234.56)"), Some(dec!(-1234.56)));
    }

    #[test]
    fn dollar_sign_and_comma() {
        assert_eq!(parse_decimal("$1,234.56"), Some(dec!(1234.56)));
    }

    #[test]
    fn pound_and_euro_symbols() {
        assert_eq!(parse_decimal("£99.00"), Some(dec!(99.00)));
        assert_eq!(parse_decimal("€1,000"), Some(dec!(1000)));
    }

    #[test]
    fn plain_negative_sign_without_parens() {
        assert_eq!(parse_decimal("-42.50"), Some(dec!(-42.50)));
    }

    #[test]
    fn empty_input_returns_none() {
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("   "), None);
    }

    #[test]
    fn non_numeric_input_returns_none() {
        assert_eq!(parse_decimal("abc"), None);
    }

    #[test]
    fn round_trips_plain_decimal() {
        assert_eq!(parse_decimal("1234.56"), Some(dec!(1234.56)));
    }

    #[test]
    fn banker_rounding_rounds_half_to_even() {
        assert_eq!(round_banker(dec!(2.345), 2), dec!(2.34));
        assert_eq!(round_banker(dec!(2.335), 2), dec!(2.34));
        assert_eq!(round_banker(dec!(2.5), 0), dec!(2));
        assert_eq!(round_banker(dec!(3.5), 0), dec!(4));
    }
}
