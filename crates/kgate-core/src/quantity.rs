//! Resource quantities (`500m`, `1Gi`, `1e3`) compared by exact value.
//!
//! Two encodings of the same amount must compare equal, so the numeric part
//! and the suffix multiplier are folded into one `BigDecimal`.

use bigdecimal::BigDecimal;
use bigdecimal::num_bigint::BigInt;
use std::fmt;
use std::str::FromStr;

use crate::error::{GateError, Result};

const BINARY_SUFFIXES: [(&str, u32); 6] = [
    ("Ki", 1),
    ("Mi", 2),
    ("Gi", 3),
    ("Ti", 4),
    ("Pi", 5),
    ("Ei", 6),
];

const DECIMAL_SUFFIXES: [(&str, i64); 9] = [
    ("n", -9),
    ("u", -6),
    ("m", -3),
    ("k", 3),
    ("M", 6),
    ("G", 9),
    ("T", 12),
    ("P", 15),
    ("E", 18),
];

/// Largest decimal exponent accepted in `<n>e<exp>` notation.
const MAX_EXPONENT: i64 = 1024;

#[derive(Debug, Clone)]
pub struct Quantity {
    value: BigDecimal,
    suffix: String,
}

impl Quantity {
    pub fn parse(raw: &str) -> Result<Self> {
        let split = raw
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '+' || c == '-'))
            .unwrap_or(raw.len());
        let (number, suffix) = raw.split_at(split);

        let number = normalize_number(number).ok_or_else(|| GateError::invalid_quantity(raw))?;
        let number =
            BigDecimal::from_str(&number).map_err(|_| GateError::invalid_quantity(raw))?;
        let multiplier = multiplier(suffix).ok_or_else(|| GateError::invalid_quantity(raw))?;

        Ok(Self {
            value: number * multiplier,
            suffix: suffix.to_string(),
        })
    }

    /// True when the quantity carries a unit suffix or a decimal exponent.
    pub fn has_suffix(&self) -> bool {
        !self.suffix.is_empty()
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Quantity {}

impl FromStr for Quantity {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value.normalized())
    }
}

/// Validates the numeric part and rewrites it into a form `BigDecimal` accepts.
fn normalize_number(number: &str) -> Option<String> {
    let (sign, digits) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number.strip_prefix('+').unwrap_or(number)),
    };

    if !digits.chars().any(|c| c.is_ascii_digit())
        || digits.chars().filter(|c| *c == '.').count() > 1
        || digits.chars().any(|c| c == '+' || c == '-')
    {
        return None;
    }

    let digits = match digits.strip_suffix('.') {
        Some(whole) => whole.to_string(),
        None if digits.starts_with('.') => format!("0{digits}"),
        None => digits.to_string(),
    };
    Some(format!("{sign}{digits}"))
}

fn multiplier(suffix: &str) -> Option<BigDecimal> {
    if suffix.is_empty() {
        return Some(BigDecimal::from(1u64));
    }
    if let Some((_, power)) = BINARY_SUFFIXES.iter().find(|(s, _)| *s == suffix) {
        return Some(BigDecimal::from(1u64 << (10 * power)));
    }
    if let Some((_, exponent)) = DECIMAL_SUFFIXES.iter().find(|(s, _)| *s == suffix) {
        return Some(pow10(*exponent));
    }

    let exponent = suffix
        .strip_prefix('e')
        .or_else(|| suffix.strip_prefix('E'))?;
    let exponent: i64 = exponent.parse().ok()?;
    if exponent.abs() > MAX_EXPONENT {
        return None;
    }
    Some(pow10(exponent))
}

fn pow10(exponent: i64) -> BigDecimal {
    BigDecimal::new(BigInt::from(1), -exponent)
}
