//! Fixed-point currency amounts.
//!
//! Amounts are held in integer minor units (centavos) so quoting never drifts.
//! Admin input such as `"8.500,00MZN"` and store numbers such as `5000.5` are
//! both converted here, rounding half-up to two decimal places.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

pub const DEFAULT_CURRENCY_SUFFIX: &str = "MZN";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyParseError {
    #[error("amount is empty")]
    Empty,
    #[error("malformed amount '{0}'")]
    Malformed(String),
    #[error("amount '{0}' is out of range")]
    Overflow(String),
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    pub fn from_major(major: i64) -> Option<Self> {
        major.checked_mul(100).map(Money)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    pub fn checked_mul(self, factor: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(factor)).map(Money)
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Parse a human-entered amount.
    ///
    /// Everything except digits, `.` and `,` is ignored. The last separator is
    /// the decimal point when one or two digits follow it; every other
    /// separator groups thousands (`"8.500,00"`, `"8,500.00"`, `"5000"`).
    pub fn parse(input: &str) -> Result<Money, MoneyParseError> {
        let kept: String = input
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
            .collect();
        if !kept.chars().any(|c| c.is_ascii_digit()) {
            return Err(MoneyParseError::Empty);
        }

        let (integer, fraction) = match kept.rfind(|c: char| c == '.' || c == ',') {
            Some(pos) if kept.len() - pos - 1 <= 2 => (&kept[..pos], &kept[pos + 1..]),
            _ => (kept.as_str(), ""),
        };
        let integer: String = integer.chars().filter(char::is_ascii_digit).collect();

        Self::parse_decimal(&format!("{integer}.{fraction}"))
            .map_err(|err| match err {
                MoneyParseError::Overflow(_) => MoneyParseError::Overflow(input.to_string()),
                _ => MoneyParseError::Malformed(input.to_string()),
            })
    }

    /// Parse a plain decimal string (`-12.345`), rounding half-up at the
    /// third fractional digit.
    pub fn parse_decimal(value: &str) -> Result<Money, MoneyParseError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(MoneyParseError::Empty);
        }
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if (integer.is_empty() && fraction.is_empty())
            || !integer.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(MoneyParseError::Malformed(value.to_string()));
        }

        let overflow = || MoneyParseError::Overflow(value.to_string());
        let mut minor: i64 = 0;
        for digit in integer.bytes() {
            minor = minor
                .checked_mul(10)
                .and_then(|acc| acc.checked_add(i64::from(digit - b'0')))
                .ok_or_else(overflow)?;
        }

        let mut digits = fraction.bytes().map(|d| i64::from(d - b'0'));
        let tenths = digits.next().unwrap_or(0);
        let hundredths = digits.next().unwrap_or(0);
        let round_up = digits.next().map_or(false, |d| d >= 5);

        minor = minor
            .checked_mul(100)
            .and_then(|acc| acc.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
            .ok_or_else(overflow)?;

        Ok(Money(if negative { -minor } else { minor }))
    }

    /// Convert a JSON number in major units. Floats go through their shortest
    /// decimal form so `1.005` rounds to `1.01`.
    pub fn from_json_number(number: &Number) -> Result<Money, MoneyParseError> {
        if let Some(major) = number.as_i64() {
            return Money::from_major(major).ok_or_else(|| MoneyParseError::Overflow(number.to_string()));
        }
        match number.as_f64() {
            Some(value) if value.is_finite() => Self::parse_decimal(&value.to_string()),
            _ => Err(MoneyParseError::Malformed(number.to_string())),
        }
    }

    /// JSON number in major units, integral when there are no centavos.
    pub fn to_json(self) -> Value {
        if self.0 % 100 == 0 {
            Value::from(self.0 / 100)
        } else {
            Number::from_f64(self.0 as f64 / 100.0)
                .map(Value::Number)
                .unwrap_or(Value::Null)
        }
    }

    /// `8.500,00MZN` style rendering used by the admin price table.
    pub fn format_with(self, suffix: &str) -> String {
        let magnitude = self.0.unsigned_abs();
        let integer = (magnitude / 100).to_string();
        let cents = magnitude % 100;

        let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
        for (i, c) in integer.chars().enumerate() {
            if i > 0 && (integer.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }

        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{sign}{grouped},{cents:02}{suffix}")
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with(DEFAULT_CURRENCY_SUFFIX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_admin_inputs() {
        assert_eq!(Money::parse("8.500,00MZN").unwrap(), Money::from_minor(850_000));
        assert_eq!(Money::parse("8,500.00").unwrap(), Money::from_minor(850_000));
        assert_eq!(Money::parse("5000").unwrap(), Money::from_minor(500_000));
        assert_eq!(Money::parse("5000.5").unwrap(), Money::from_minor(500_050));
        assert_eq!(Money::parse("5.000").unwrap(), Money::from_minor(500_000));
        assert_eq!(Money::parse(" 12,3 MT").unwrap(), Money::from_minor(1_230));
    }

    #[test]
    fn rejects_inputs_without_digits() {
        assert_eq!(Money::parse("MZN"), Err(MoneyParseError::Empty));
        assert_eq!(Money::parse(""), Err(MoneyParseError::Empty));
    }

    #[test]
    fn decimal_rounds_half_up() {
        assert_eq!(Money::parse_decimal("1.005").unwrap(), Money::from_minor(101));
        assert_eq!(Money::parse_decimal("1.004").unwrap(), Money::from_minor(100));
        assert_eq!(Money::parse_decimal("0.129").unwrap(), Money::from_minor(13));
        assert_eq!(Money::parse_decimal("-2.5").unwrap(), Money::from_minor(-250));
        assert!(Money::parse_decimal("1.2.3").is_err());
        assert!(Money::parse_decimal(".").is_err());
    }

    #[test]
    fn json_numbers_round_trip_through_shortest_decimal() {
        let number = Number::from_f64(1.005).unwrap();
        assert_eq!(Money::from_json_number(&number).unwrap(), Money::from_minor(101));
        assert_eq!(
            Money::from_json_number(&Number::from(5000)).unwrap(),
            Money::from_minor(500_000)
        );
        assert_eq!(Money::from_minor(500_000).to_json(), Value::from(5000));
        assert_eq!(Money::from_minor(500_050).to_json(), Value::from(5000.5));
    }

    #[test]
    fn formats_with_thousands_groups() {
        assert_eq!(Money::from_minor(850_000).to_string(), "8.500,00MZN");
        assert_eq!(Money::from_minor(5).format_with(""), "0,05");
        assert_eq!(Money::from_minor(123_456_789).format_with(" MT"), "1.234.567,89 MT");
        assert_eq!(Money::from_minor(-1_000).to_string(), "-10,00MZN");
    }
}
