//! Amount helpers.
//!
//! The backend sends prices and totals as JSON numbers, occasionally as
//! strings. Internally every amount is a `BigDecimal` so totals never pick up
//! floating-point noise.

use std::str::FromStr;

use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(serde_json::Number),
    Text(String),
}

impl RawAmount {
    fn into_decimal(self) -> Result<BigDecimal, String> {
        let text = match self {
            RawAmount::Number(n) => n.to_string(),
            RawAmount::Text(s) => s,
        };
        BigDecimal::from_str(text.trim()).map_err(|e| format!("invalid amount '{}': {}", text, e))
    }
}

/// Parse an amount typed by a user or read from configuration.
pub fn parse_amount(text: &str) -> Option<BigDecimal> {
    BigDecimal::from_str(text.trim()).ok()
}

/// Two-decimal rendering used wherever an amount is shown, e.g. `20.00`.
pub fn format_amount(value: &BigDecimal) -> String {
    value.round(2).with_scale(2).to_string()
}

pub fn zero() -> BigDecimal {
    BigDecimal::zero()
}

/// `#[serde(with = "money::as_number")]` for required amounts.
pub mod as_number {
    use super::*;

    pub fn serialize<S: Serializer>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error> {
        let n = value
            .to_f64()
            .ok_or_else(|| S::Error::custom(format!("amount {} is out of range", value)))?;
        serializer.serialize_f64(n)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigDecimal, D::Error> {
        RawAmount::deserialize(deserializer)?
            .into_decimal()
            .map_err(D::Error::custom)
    }
}

/// `#[serde(with = "money::opt_as_number", default)]` for optional amounts.
pub mod opt_as_number {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<BigDecimal>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => as_number::serialize(v, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<BigDecimal>, D::Error> {
        Option::<RawAmount>::deserialize(deserializer)?
            .map(RawAmount::into_decimal)
            .transpose()
            .map_err(D::Error::custom)
    }
}
