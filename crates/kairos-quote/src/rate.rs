//! The exchange-rate record and its wire format.
//!
//! The upstream API encodes every number as a JSON string and wraps the
//! record in the currency-pair key:
//!
//! ```json
//! {"USDBRL": {"code": "USD", "codein": "BRL", "bid": "5.4312", "timestamp": "1700000000"}}
//! ```
//!
//! [`decode_rate`] accepts that shape or the bare record. Numbers are accepted
//! as strings or as JSON numbers and are always written back as strings.

use kairos_core::{CallError, CallResult};
use serde::{Deserialize, Serialize};

/// One exchange-rate quotation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeRate {
    /// Source currency code (e.g. `USD`).
    pub code: String,
    /// Target currency code (e.g. `BRL`).
    pub codein: String,
    /// Human-readable pair name.
    pub name: String,
    /// Highest price of the period.
    #[serde(with = "numeric_string")]
    pub high: f64,
    /// Lowest price of the period.
    #[serde(with = "numeric_string")]
    pub low: f64,
    /// Bid variation.
    #[serde(rename = "varBid", with = "numeric_string")]
    pub var_bid: f64,
    /// Percent change.
    #[serde(rename = "pctChange", with = "numeric_string")]
    pub pct_change: f64,
    /// Buy price.
    #[serde(with = "numeric_string")]
    pub bid: f64,
    /// Sell price.
    #[serde(with = "numeric_string")]
    pub ask: f64,
    /// Unix timestamp of the quotation, in seconds.
    #[serde(with = "numeric_string")]
    pub timestamp: i64,
    /// Quotation date as reported upstream.
    pub create_date: String,
}

/// Decodes an upstream body into an [`ExchangeRate`].
///
/// The record may be wrapped in `pair` or be the top-level object. A body
/// without a `bid` is not a quotation and is rejected.
pub fn decode_rate(body: &[u8], pair: &str) -> CallResult<ExchangeRate> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| CallError::decode(e.to_string()))?;

    let record = match value.get(pair) {
        Some(inner) if inner.is_object() => inner.clone(),
        _ => value,
    };

    let Some(fields) = record.as_object() else {
        return Err(CallError::decode("expected a JSON object"));
    };
    if !fields.contains_key("bid") {
        return Err(CallError::decode(format!("missing bid for pair {pair}")));
    }

    serde_json::from_value(record).map_err(|e| CallError::decode(e.to_string()))
}

/// Serde adapter for numbers carried as JSON strings.
pub mod numeric_string {
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Number(T),
        Text(String),
    }

    /// Writes the number as a string.
    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    /// Reads a number from a string or a JSON number.
    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr + Deserialize<'de>,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        match Raw::<T>::deserialize(deserializer)? {
            Raw::Number(value) => Ok(value),
            Raw::Text(text) => text
                .trim()
                .parse()
                .map_err(|e| D::Error::custom(format!("invalid number {text:?}: {e}"))),
        }
    }
}
