//! Duration strings in configuration files.

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Suffix to nanoseconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("µs", 1_000.0),
    ("us", 1_000.0),
    ("ms", 1_000_000.0),
    ("s", 1_000_000_000.0),
    ("m", 60_000_000_000.0),
    ("h", 3_600_000_000_000.0),
];

/// A duration string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid duration {0:?}: expected numbers followed by ns, us, ms, s, m or h, e.g. 30s or 1m30s")]
pub struct DurationError(pub String);

/// Parse duration strings like "30s", "1.5m", "250ms", "1h30m"
///
/// A sequence of number and unit pairs is summed. A bare "0" is zero.
pub fn parse_duration(s: &str) -> Result<Duration, DurationError> {
    let input = s.trim();
    let invalid = || DurationError(input.to_string());

    if input == "0" {
        return Ok(Duration::ZERO);
    }
    if input.is_empty() {
        return Err(invalid());
    }

    let mut rest = input;
    let mut total_nanos = 0.0_f64;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let val: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let (suffix, multiplier) = UNITS
            .iter()
            .find(|(suffix, _)| rest.starts_with(suffix))
            .ok_or_else(invalid)?;
        rest = &rest[suffix.len()..];

        total_nanos += val * multiplier;
    }

    if !total_nanos.is_finite() || total_nanos < 0.0 {
        return Err(invalid());
    }
    Ok(Duration::from_nanos(total_nanos as u64))
}

/// A duration as written in configuration: a suffixed string or whole seconds.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Text(String),
    Seconds(u64),
}

impl RawDuration {
    fn into_duration(self) -> Result<Duration, DurationError> {
        match self {
            RawDuration::Text(s) => parse_duration(&s),
            RawDuration::Seconds(secs) => Ok(Duration::from_secs(secs)),
        }
    }
}

/// Deserialize a required duration.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    RawDuration::deserialize(deserializer)?
        .into_duration()
        .map_err(serde::de::Error::custom)
}

/// Deserialize an optional duration.
pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawDuration>::deserialize(deserializer)?
        .map(RawDuration::into_duration)
        .transpose()
        .map_err(serde::de::Error::custom)
}
