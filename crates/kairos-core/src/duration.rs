//! Human-readable durations for configuration files and command lines.
//!
//! Accepts an integer followed by `ms`, `s`, `m` or `h` (`"200ms"`, `"10s"`).
//! A bare integer is read as seconds.

use std::time::Duration;

/// Parses a duration such as `"200ms"`, `"1s"`, `"5m"` or `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let invalid = || format!("invalid duration: {s:?}");
    let number = |digits: &str| -> Result<u64, String> {
        digits.trim().parse().map_err(|_| invalid())
    };
    let scaled = |digits: &str, factor: u64| -> Result<u64, String> {
        number(digits)?.checked_mul(factor).ok_or_else(invalid)
    };

    if let Some(stripped) = s.strip_suffix("ms") {
        Ok(Duration::from_millis(number(stripped)?))
    } else if let Some(stripped) = s.strip_suffix('s') {
        Ok(Duration::from_secs(number(stripped)?))
    } else if let Some(stripped) = s.strip_suffix('m') {
        Ok(Duration::from_secs(scaled(stripped, 60)?))
    } else if let Some(stripped) = s.strip_suffix('h') {
        Ok(Duration::from_secs(scaled(stripped, 3600)?))
    } else {
        Ok(Duration::from_secs(number(s)?))
    }
}

/// Formats a duration in the shortest exact unit accepted by [`parse_duration`].
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis % 1000 != 0 {
        format!("{millis}ms")
    } else {
        format!("{}s", duration.as_secs())
    }
}

/// `#[serde(with = "kairos_core::duration::serde")]` support.
pub mod serde {
    use std::time::Duration;

    use ::serde::{Deserialize, Deserializer, Serializer};

    /// Serializes a duration as a string like `"200ms"`.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_duration(*duration))
    }

    /// Deserializes a duration from a string like `"200ms"`.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_duration(&s).map_err(::serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_duration("200ms"), Ok(Duration::from_millis(200)));
        assert_eq!(parse_duration("10s"), Ok(Duration::from_secs(10)));
        assert_eq!(parse_duration("5m"), Ok(Duration::from_secs(300)));
        assert_eq!(parse_duration("2h"), Ok(Duration::from_secs(7200)));
        assert_eq!(parse_duration(" 3 "), Ok(Duration::from_secs(3)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_duration("fast").is_err());
        assert!(parse_duration("1.5s").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn test_parse_rejects_overflowing_units() {
        assert!(parse_duration("999999999999999999m").is_err());
        assert!(parse_duration("18446744073709551615h").is_err());
        assert_eq!(
            parse_duration("18446744073709551615s"),
            Ok(Duration::from_secs(u64::MAX))
        );
    }

    #[test]
    fn test_format_round_trips_common_values() {
        assert_eq!(format_duration(Duration::from_millis(10)), "10ms");
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1500ms");
    }
}
