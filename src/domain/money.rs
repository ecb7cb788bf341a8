use std::fmt;

use serde::{de, Deserialize, Deserializer};

/// Money is held as integer cents so balances never accumulate floating-point drift.
/// 1 unit = 100 cents, so 50.00 = 5000 cents.
pub type Cents = i64;

/// Largest accepted magnitude for a single amount (one trillion units).
pub const MAX_AMOUNT: f64 = 1e12;

/// Largest magnitude a balance or total may reach, in cents. Keeps every
/// stored total representable both as `Cents` and as a JSON number.
pub const MAX_TOTAL_CENTS: Cents = 1_000_000_000_000_000_000;

/// Convert a floating amount to cents, rounding half away from zero.
/// This is the only place amounts are rounded; rounding to 2 decimals is
/// `from_cents(to_cents(x))`. Example: 1.005 -> 100 (binary 1.00499..),
/// -75.005 -> -7501.
pub fn to_cents(value: f64) -> Cents {
    (value * 100.0).round() as Cents
}

/// Convert cents back to a floating amount with at most 2 fractional digits.
pub fn from_cents(cents: Cents) -> f64 {
    cents as f64 / 100.0
}

/// Format cents as a human-readable currency string.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    let units = abs_cents / 100;
    let remainder = abs_cents % 100;
    format!("{}{}.{:02}", sign, units, remainder)
}

/// Parse a decimal string into cents, rounding extra digits half away from zero.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000, "0.125" -> 13
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let negative = input.starts_with('-');
    let input = input.trim_start_matches(['-', '+']);

    let digits = |s: &str| -> Result<i64, ParseCentsError> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseCentsError::InvalidFormat);
        }
        s.parse().map_err(|_| ParseCentsError::InvalidFormat)
    };

    let cents = match input.split_once('.') {
        None => digits(input)?
            .checked_mul(100)
            .ok_or(ParseCentsError::InvalidFormat)?,
        Some((whole, fraction)) => {
            let units = if whole.is_empty() { 0 } else { digits(whole)? };
            if whole.is_empty() && fraction.is_empty() {
                return Err(ParseCentsError::InvalidFormat);
            }

            let fraction_cents = match fraction.len() {
                0 => 0,
                // "5" means 50 cents
                1 => digits(fraction)? * 10,
                2 => digits(fraction)?,
                _ => {
                    digits(fraction)?;
                    let kept: i64 = fraction[..2]
                        .parse()
                        .map_err(|_| ParseCentsError::InvalidFormat)?;
                    if fraction.as_bytes()[2] >= b'5' {
                        kept + 1
                    } else {
                        kept
                    }
                }
            };

            units
                .checked_mul(100)
                .and_then(|c| c.checked_add(fraction_cents))
                .ok_or(ParseCentsError::InvalidFormat)?
        }
    };

    Ok(if negative { -cents } else { cents })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
        }
    }
}

impl std::error::Error for ParseCentsError {}

/// A balance or total left the representable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountOverflow;

impl fmt::Display for AmountOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount out of range")
    }
}

impl std::error::Error for AmountOverflow {}

fn within_total(cents: Option<Cents>) -> Result<Cents, AmountOverflow> {
    cents
        .filter(|c| c.unsigned_abs() < MAX_TOTAL_CENTS.unsigned_abs())
        .ok_or(AmountOverflow)
}

/// `a + b`, failing instead of leaving the total range.
pub fn add_cents(a: Cents, b: Cents) -> Result<Cents, AmountOverflow> {
    within_total(a.checked_add(b))
}

/// `a - b`, failing instead of leaving the total range.
pub fn sub_cents(a: Cents, b: Cents) -> Result<Cents, AmountOverflow> {
    within_total(a.checked_sub(b))
}

/// `|a|`, failing for values outside the total range.
pub fn abs_cents(a: Cents) -> Result<Cents, AmountOverflow> {
    within_total(a.checked_abs())
}

/// Decode a JSON number into cents, rejecting values at or beyond `limit` units.
fn cents_within<'de, D: Deserializer<'de>>(
    deserializer: D,
    limit: f64,
) -> Result<Cents, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() {
        return Err(de::Error::custom("amount must be a finite number"));
    }
    if value.abs() >= limit {
        return Err(de::Error::custom(format!("amount {} is out of range", value)));
    }
    Ok(to_cents(value))
}

/// Serde adapter storing a single amount as a plain JSON number (`12.5`, `-40`).
pub mod amount {
    use serde::{Deserializer, Serializer};

    use super::{cents_within, from_cents, Cents, MAX_AMOUNT};

    pub fn serialize<S: Serializer>(cents: &Cents, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(from_cents(*cents))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Cents, D::Error> {
        cents_within(deserializer, MAX_AMOUNT)
    }
}

/// Same as [`amount`] for balances and totals, which may exceed a single amount.
pub mod total {
    use serde::{Deserializer, Serializer};

    use super::{cents_within, from_cents, Cents, MAX_TOTAL_CENTS};

    pub fn serialize<S: Serializer>(cents: &Cents, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(from_cents(*cents))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Cents, D::Error> {
        cents_within(deserializer, from_cents(MAX_TOTAL_CENTS))
    }
}
