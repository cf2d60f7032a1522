//! Currency codec for masked money inputs
//!
//! Money is held as an exact number of cents. The display form groups thousands
//! with `.` and uses `,` as the decimal separator (`1.234.567,89`), matching the
//! masked input fields of the listing forms.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Non-negative money amount with cent precision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount {
    cents: u64,
}

impl Amount {
    pub const ZERO: Amount = Amount { cents: 0 };

    pub const fn from_cents(cents: u64) -> Self {
        Self { cents }
    }

    pub const fn cents(self) -> u64 {
        self.cents
    }

    /// Parse a masked display string
    ///
    /// Every non-digit character is dropped and the remaining digits are read as
    /// a number of cents. Empty or digit-free input yields zero. Inputs longer
    /// than `u64` cents saturate.
    pub fn parse_display(input: &str) -> Self {
        let cents = input
            .chars()
            .filter_map(|c| c.to_digit(10))
            .fold(0u64, |acc, d| acc.saturating_mul(10).saturating_add(u64::from(d)));
        Self { cents }
    }

    /// Render with thousands grouping and exactly two decimals (`1.234,50`)
    pub fn format_display(self) -> String {
        let whole = (self.cents / 100).to_string();
        let frac = self.cents % 100;

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3 + 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        format!("{},{:02}", grouped, frac)
    }

    /// Value as a floating point number of reais, for remote numeric columns
    pub fn as_f64(self) -> f64 {
        self.cents as f64 / 100.0
    }

    /// Convert a remote numeric value, rounding to the nearest cent
    ///
    /// Negative and non-finite values are rejected.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        let cents = (value * 100.0).round();
        if cents > u64::MAX as f64 {
            return None;
        }
        Some(Self {
            cents: cents as u64,
        })
    }

    /// Lenient conversion from a remote JSON value (number or numeric string)
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    u.checked_mul(100).map(Self::from_cents)
                } else {
                    n.as_f64().and_then(Self::from_f64)
                }
            }
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_display())
    }
}

/// Error parsing a plain decimal amount such as `150000.00`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid amount: {0}")]
pub struct ParseAmountError(String);

impl FromStr for Amount {
    type Err = ParseAmountError;

    /// Parse a plain decimal (`.` separator, at most two fractional digits)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseAmountError(s.to_string());
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(err());
        }
        if frac.len() > 2
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(err());
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| err())?
        };
        let frac: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().map_err(|_| err())? * 10,
            _ => frac.parse().map_err(|_| err())?,
        };

        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .map(Self::from_cents)
            .ok_or_else(err)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid amount: {}", value)))
    }
}
