//! Human duration strings such as `"1m0s"` or `"1h30m"`.
//!
//! Declarative configuration spells scan intervals the way Go's
//! `time.Duration` prints them; the API carries integer milliseconds.
//! [`format_duration`] is the canonical printer so that a value read back from
//! the API compares equal to what was configured.

use std::time::Duration;

use crate::error::ProviderError;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MINUTE: u128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MINUTE;

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SECOND),
        "m" => Some(NANOS_PER_MINUTE),
        "h" => Some(NANOS_PER_HOUR),
        _ => None,
    }
}

/// Parse a duration string made of `<number><unit>` pairs.
///
/// Units are `ns`, `us`/`µs`, `ms`, `s`, `m` and `h`; numbers may carry a
/// fraction (`"1.5h"`). A bare `"0"` is accepted. Negative durations are
/// rejected since no interval field accepts them.
pub fn parse_duration(input: &str) -> Result<Duration, ProviderError> {
    let invalid = || ProviderError::Validation(format!("invalid duration {:?}", input));

    let s = input.trim();
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() || s.starts_with('-') {
        return Err(invalid());
    }
    let s = s.strip_prefix('+').unwrap_or(s);

    let mut total: u128 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        let (number, tail) = rest.split_at(number_len);
        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);

        let scale = unit_nanos(unit).ok_or_else(invalid)?;
        let (whole, frac) = match number.split_once('.') {
            Some((w, f)) => (w, f),
            None => (number, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let mut value = whole.checked_mul(scale).ok_or_else(invalid)?;

        let mut divisor: u128 = 1;
        let mut frac_value: u128 = 0;
        for digit in frac.chars() {
            let d = digit.to_digit(10).ok_or_else(invalid)? as u128;
            // Digits beyond nanosecond precision cannot change the result.
            if divisor >= NANOS_PER_SECOND * 10 {
                break;
            }
            frac_value = frac_value * 10 + d;
            divisor *= 10;
        }
        value += frac_value * scale / divisor;

        total = total.checked_add(value).ok_or_else(invalid)?;
        rest = tail;
    }

    let secs = u64::try_from(total / NANOS_PER_SECOND).map_err(|_| invalid())?;
    Ok(Duration::new(secs, (total % NANOS_PER_SECOND) as u32))
}

/// Format a duration the way Go's `time.Duration` prints it.
///
/// `60s` prints as `"1m0s"`, `90m` as `"1h30m0s"`, `1500ms` as `"1.5s"`.
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < NANOS_PER_MICRO {
        return format!("{}ns", nanos);
    }
    if nanos < NANOS_PER_MILLI {
        return format!("{}µs", decimal(nanos, NANOS_PER_MICRO));
    }
    if nanos < NANOS_PER_SECOND {
        return format!("{}ms", decimal(nanos, NANOS_PER_MILLI));
    }

    let hours = nanos / NANOS_PER_HOUR;
    let minutes = (nanos % NANOS_PER_HOUR) / NANOS_PER_MINUTE;
    let seconds = decimal(nanos % NANOS_PER_MINUTE, NANOS_PER_SECOND);

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// `value / unit` with the remainder printed as a trimmed decimal fraction.
fn decimal(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let remainder = value % unit;
    if remainder == 0 {
        return whole.to_string();
    }
    let width = (unit as f64).log10().round() as usize;
    let frac = format!("{:0width$}", remainder, width = width);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

/// Serde adapter for optional durations carried as integer milliseconds.
///
/// A zero or absent value decodes to `None`.
pub mod millis_option {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as whole milliseconds.
    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => serializer.serialize_u64(d.as_millis() as u64),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize from whole milliseconds.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.filter(|ms| *ms > 0).map(Duration::from_millis))
    }
}
