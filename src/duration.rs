//! `Duration` in the textual form `<number><whitespace?><unit>`.
//!
//! A bare number, as a string or a numeric node, means milliseconds. Decimals
//! are allowed (`1.5 hours`). Written durations use the largest unit that
//! represents the value exactly (`"21 days"`, `"90 seconds"`).

use std::time::Duration;

use crate::convert::{ReadConfig, WriteConfig, WriteContext};
use crate::cursor::ConfigCursor;
use crate::failure::{FailureReason, ReadResult};
use crate::value::{ConfigValue, Number, ValueKind};

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MINUTE: u128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MINUTE;
const NANOS_PER_DAY: u128 = 24 * NANOS_PER_HOUR;

/// Largest first; the writer picks the first that divides evenly.
const UNITS: &[(u128, &str)] = &[
    (NANOS_PER_DAY, "day"),
    (NANOS_PER_HOUR, "hour"),
    (NANOS_PER_MINUTE, "minute"),
    (NANOS_PER_SECOND, "second"),
    (NANOS_PER_MILLI, "millisecond"),
    (NANOS_PER_MICRO, "microsecond"),
    (1, "nanosecond"),
];

fn unit_nanos(unit: &str) -> Option<u128> {
    let nanos = match unit {
        "ns" | "nano" | "nanos" | "nanosecond" | "nanoseconds" => 1,
        "us" | "µs" | "micro" | "micros" | "microsecond" | "microseconds" => NANOS_PER_MICRO,
        "" | "ms" | "milli" | "millis" | "millisecond" | "milliseconds" => NANOS_PER_MILLI,
        "s" | "second" | "seconds" => NANOS_PER_SECOND,
        "m" | "minute" | "minutes" => NANOS_PER_MINUTE,
        "h" | "hour" | "hours" => NANOS_PER_HOUR,
        "d" | "day" | "days" => NANOS_PER_DAY,
        _ => return None,
    };
    Some(nanos)
}

fn from_nanos(nanos: u128) -> Option<Duration> {
    let secs = u64::try_from(nanos / NANOS_PER_SECOND).ok()?;
    let subsec = u32::try_from(nanos % NANOS_PER_SECOND).ok()?;
    Some(Duration::new(secs, subsec))
}

/// Parse `"7 days"`, `"250ms"`, `"1.5h"` or a bare millisecond count.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.starts_with('-') {
        return Err("negative durations are not supported".to_string());
    }
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    if number.is_empty() {
        return Err("expected a number followed by an optional time unit".to_string());
    }
    let unit = unit.trim();
    let Some(scale) = unit_nanos(unit) else {
        return Err(format!(
            "unknown time unit '{unit}' (expected ns, us, ms, s, m, h or d)"
        ));
    };

    if let Ok(whole) = number.parse::<u128>() {
        return whole
            .checked_mul(scale)
            .and_then(from_nanos)
            .ok_or_else(|| "duration is too large".to_string());
    }
    let x: f64 = number
        .parse()
        .map_err(|_| format!("'{number}' is not a valid number"))?;
    Duration::try_from_secs_f64(x * scale as f64 / NANOS_PER_SECOND as f64)
        .map_err(|e| e.to_string())
}

/// Render with the largest unit that represents `duration` exactly.
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0 seconds".to_string();
    }
    let (scale, name) = UNITS
        .iter()
        .copied()
        .find(|(scale, _)| nanos % scale == 0)
        .unwrap_or((1, "nanosecond"));
    let count = nanos / scale;
    if count == 1 {
        format!("1 {name}")
    } else {
        format!("{count} {name}s")
    }
}

impl ReadConfig for Duration {
    fn read_config(cursor: &ConfigCursor<'_>) -> ReadResult<Self> {
        let value = cursor.defined()?;
        let text = match value.kind() {
            ValueKind::Number(Number::Integer(ms)) => ms.to_string(),
            ValueKind::Number(Number::Float(ms)) => ms.to_string(),
            _ => cursor.as_string()?,
        };
        parse_duration(&text)
            .or_else(|because| cursor.fail(FailureReason::cannot_convert(text, "Duration", because)))
    }
}

impl WriteConfig for Duration {
    fn write_with(&self, _ctx: &WriteContext<'_>) -> ConfigValue {
        ConfigValue::string(format_duration(*self))
    }
}
