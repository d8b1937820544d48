//! Wall-clock helpers: day strings, calendar-day arithmetic, and lenient
//! timestamp deserialization.
//!
//! All timestamps in punch are unix seconds (`i64`). The wire format the
//! model is loaded from historically stored timestamps as JSON numbers and
//! used `0` for "unset", so deserialization coerces non-finite values to 0
//! and treats non-positive optional timestamps as absent. Inside the crate
//! an absent timestamp is always `None`, never 0.

use chrono::DateTime;
use serde::{Deserialize, Deserializer};

/// Seconds in a civil day.
pub const SECS_PER_DAY: i64 = 86_400;

/// Render a timestamp as its human-readable day string (`MM/DD/YYYY`, UTC).
///
/// Returns `None` for timestamps outside chrono's representable range.
#[must_use]
pub fn day_string(ts: i64) -> Option<String> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.format("%m/%d/%Y").to_string())
}

/// Whole calendar days between two timestamps (UTC civil dates).
///
/// `calendar_days_between(a, b)` is positive when `b`'s date is after
/// `a`'s, regardless of time of day. Out-of-range timestamps fall back to
/// elapsed-seconds division.
#[must_use]
pub fn calendar_days_between(from: i64, to: i64) -> i64 {
    match (DateTime::from_timestamp(from, 0), DateTime::from_timestamp(to, 0)) {
        (Some(a), Some(b)) => (b.date_naive() - a.date_naive()).num_days(),
        _ => (to - from).div_euclid(SECS_PER_DAY),
    }
}

/// Treat an optional timestamp as present only when it is a positive
/// number of seconds (the wire format's 0 means "unset").
#[must_use]
pub const fn present(ts: Option<i64>) -> Option<i64> {
    match ts {
        Some(t) if t > 0 => Some(t),
        _ => None,
    }
}

/// Deserialize a required unix-seconds field, coercing non-finite numbers
/// to 0.
///
/// # Errors
///
/// Returns an error when the value is not a number.
pub fn lenient_seconds<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(coerce)
}

/// Deserialize an optional unix-seconds field. Non-finite and non-positive
/// values become `None`.
///
/// # Errors
///
/// Returns an error when the value is present but not a number.
pub fn lenient_seconds_opt<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(present(raw.map(coerce)))
}

#[allow(clippy::cast_possible_truncation)]
fn coerce(raw: f64) -> i64 {
    if raw.is_finite() { raw as i64 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_string_renders_utc_dates() {
        // 2020-01-01T00:00:00Z
        assert_eq!(day_string(1_577_836_800).as_deref(), Some("01/01/2020"));
        // 2020-01-01T23:59:59Z is still the same day
        assert_eq!(day_string(1_577_923_199).as_deref(), Some("01/01/2020"));
    }

    #[test]
    fn calendar_days_ignore_time_of_day() {
        // 2020-01-01T23:00:00Z -> 2020-01-06T01:00:00Z is barely over four
        // elapsed days but five calendar days apart.
        let from = 1_577_919_600;
        let to = from + 4 * SECS_PER_DAY + 2 * 3_600;
        assert_eq!(calendar_days_between(from, to), 5);
    }

    #[test]
    fn calendar_days_can_be_negative() {
        let from = 1_577_836_800;
        assert_eq!(calendar_days_between(from, from - SECS_PER_DAY), -1);
    }

    #[test]
    fn present_filters_zero_and_negative() {
        assert_eq!(present(Some(1_577_836_800)), Some(1_577_836_800));
        assert_eq!(present(Some(0)), None);
        assert_eq!(present(Some(-5)), None);
        assert_eq!(present(None), None);
    }

    #[test]
    fn coerce_maps_non_finite_to_zero() {
        assert_eq!(coerce(f64::NAN), 0);
        assert_eq!(coerce(f64::INFINITY), 0);
        assert_eq!(coerce(f64::NEG_INFINITY), 0);
        assert_eq!(coerce(42.9), 42);
    }

    #[test]
    fn lenient_optional_seconds_accept_floats() {
        #[derive(serde::Deserialize)]
        struct Wire {
            #[serde(default, deserialize_with = "lenient_seconds_opt")]
            ts: Option<i64>,
        }

        let wire: Wire = serde_json::from_str(r#"{"ts": 1577836800.25}"#).expect("parse");
        assert_eq!(wire.ts, Some(1_577_836_800));

        let unset: Wire = serde_json::from_str(r#"{"ts": 0}"#).expect("parse");
        assert_eq!(unset.ts, None);

        let absent: Wire = serde_json::from_str("{}").expect("parse");
        assert_eq!(absent.ts, None);
    }
}
