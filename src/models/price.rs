//! Operator price input
//!
//! Price fields are typed by an operator as text. Input is checked in two
//! places: keystrokes that could never become a price are refused as they are
//! typed, and the final text is parsed into `Money` before anything is saved.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::money::Money;

/// Largest price an operator may enter: 9,999,999.99
pub const MAX_PRICE: Money = Money::from_cents(999_999_999);

/// Characters an operator may leave in a price field: digits and at most one
/// decimal point. No sign, no currency symbol.
static PRICE_INPUT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d*\.?\d*$").expect("price input pattern to compile")
});

/// Why a piece of price text could not become a price
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceInputError {
    #[error("price cannot be negative: '{0}'")]
    Negative(String),

    #[error("not a number: '{0}'")]
    NotNumeric(String),

    #[error("at most two decimal places are allowed: '{0}'")]
    TooPrecise(String),

    #[error("price is too large (maximum 9999999.99): '{0}'")]
    TooLarge(String),
}

/// Input-layer check: may this text stay in a price field?
///
/// Empty text is allowed (the field is being cleared), and so are partial
/// forms like "12." that are still being typed.
pub fn is_acceptable_input(input: &str) -> bool {
    input.is_empty() || PRICE_INPUT_PATTERN.is_match(input)
}

/// Parse operator text into a non-negative price
///
/// Empty text is read as zero. Anything that is not an unsigned decimal with
/// at most two fraction digits is rejected; nothing is rounded. Prices above
/// `MAX_PRICE` are rejected so that totals of many line items stay exact.
pub fn parse_price(input: &str) -> Result<Money, PriceInputError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Ok(Money::zero());
    }

    if let Some(rest) = trimmed.strip_prefix('-') {
        return match parse_unsigned(rest.trim(), trimmed) {
            Ok(_) => Err(PriceInputError::Negative(trimmed.to_string())),
            Err(e) => Err(e),
        };
    }

    parse_unsigned(trimmed, trimmed)
}

fn parse_unsigned(s: &str, original: &str) -> Result<Money, PriceInputError> {
    let not_numeric = || PriceInputError::NotNumeric(original.to_string());

    if s.is_empty() || s == "." || !PRICE_INPUT_PATTERN.is_match(s) {
        return Err(not_numeric());
    }

    let (whole, fraction) = match s.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (s, ""),
    };

    if fraction.len() > 2 {
        return Err(PriceInputError::TooPrecise(original.to_string()));
    }

    let too_large = || PriceInputError::TooLarge(original.to_string());

    let digits = whole.trim_start_matches('0');
    if digits.len() > 18 {
        return Err(too_large());
    }
    let units: i64 = if digits.is_empty() {
        0
    } else {
        digits.parse().map_err(|_| not_numeric())?
    };

    let cents: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().map_err(|_| not_numeric())? * 10,
        _ => fraction.parse().map_err(|_| not_numeric())?,
    };

    units
        .checked_mul(100)
        .and_then(|c| c.checked_add(cents))
        .map(Money::from_cents)
        .filter(|price| *price <= MAX_PRICE)
        .ok_or_else(too_large)
}
