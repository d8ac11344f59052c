//! Field-level canonicalization used for equality and hashing.
//!
//! Both functions are pure and idempotent: feeding a canonical value back in
//! returns it unchanged.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;

/// Store decimals used when no precision is configured
pub const DEFAULT_PRICE_DECIMALS: u32 = 2;

/// Canonical product name.
///
/// Removes backslash escape artifacts (`l\m` → `lm`), decodes HTML entities,
/// trims, collapses whitespace runs and applies NFC.
pub fn canonicalize_name(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    let unslashed: String = raw.chars().filter(|c| *c != '\\').collect();
    let decoded = html_escape::decode_html_entities(&unslashed);
    let collapsed = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
    Some(collapsed.nfc().collect())
}

/// Canonical price with [`DEFAULT_PRICE_DECIMALS`].
pub fn canonicalize_price(raw: Option<&str>) -> Option<String> {
    canonicalize_price_with(raw, DEFAULT_PRICE_DECIMALS)
}

/// Canonical price rounded to `decimals` places.
///
/// `"120.00"` → `"120"`, `"0.090"` → `"0.09"`, `"0.00"` → `"0"`.
/// Empty or non-numeric input yields `None`.
pub fn canonicalize_price_with(raw: Option<&str>, decimals: u32) -> Option<String> {
    let value = parse_price(raw?)?;
    let rounded = value
        .round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
        .normalize();

    if rounded.is_zero() {
        return Some("0".to_string());
    }
    Some(rounded.to_string())
}

/// Parses a decimal price string (plain or scientific notation).
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}
