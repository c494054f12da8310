//! Timestamp and duration formatting.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::fmt::Write;
use std::time::{Duration, SystemTime};

/// Timestamp types that can be logged as a UTC instant.
///
/// Generated code calls [`LogTime::to_utc`] for every field resolved to a
/// time value, so any of these types can appear in a record.
pub trait LogTime {
    /// Returns the instant in UTC.
    fn to_utc(&self) -> DateTime<Utc>;
}

impl<Tz: TimeZone> LogTime for DateTime<Tz> {
    #[inline]
    fn to_utc(&self) -> DateTime<Utc> {
        self.with_timezone(&Utc)
    }
}

/// Naive timestamps are taken to already be in UTC.
impl LogTime for NaiveDateTime {
    #[inline]
    fn to_utc(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(self)
    }
}

impl LogTime for SystemTime {
    #[inline]
    fn to_utc(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from(*self)
    }
}

/// Formats a timestamp as ISO-8601 with millisecond precision.
///
/// `2022-11-20 10:01:01 UTC` becomes `2022-11-20T10:01:01.000Z`.
#[must_use]
pub fn format_time(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Formats a duration as a short unit string.
///
/// Sub-second values use a single unit (`750ns`, `1.5µs`, `20ms`); longer
/// values are split into hours, minutes and seconds (`1s`, `1m30s`,
/// `2h0m0.5s`). The zero duration is `0s`.
#[must_use]
pub fn format_duration(value: Duration) -> String {
    let nanos = value.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }

    if nanos < 1_000_000_000 {
        let (precision, unit) = match nanos {
            n if n < 1_000 => (0, "ns"),
            n if n < 1_000_000 => (3, "µs"),
            _ => (6, "ms"),
        };
        return format!("{}{}", format_scaled(nanos, precision), unit);
    }

    let total_secs = value.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs / 60) % 60;
    let seconds = u128::from(total_secs % 60) * 1_000_000_000 + u128::from(value.subsec_nanos());

    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    out.push_str(&format_scaled(seconds, 9));
    out.push('s');
    out
}

/// Renders `value / 10^precision` with trailing fractional zeros removed.
fn format_scaled(value: u128, precision: u32) -> String {
    let scale = 10u128.pow(precision);
    let whole = value / scale;
    let fraction = value % scale;
    if fraction == 0 {
        return whole.to_string();
    }

    let digits = format!("{:0width$}", fraction, width = precision as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
