//! Time source for block construction.
//!
//! Blocks never read the wall clock themselves; a [`Clock`] is passed in so
//! callers (and tests) decide what "now" means.

use chrono::{DateTime, Duration, FixedOffset, Offset, SecondsFormat, Timelike, Utc};
use std::sync::Mutex;

/// A block timestamp with an explicit UTC offset.
pub type Timestamp = DateTime<FixedOffset>;

/// Source of block timestamps.
pub trait Clock: Send + Sync {
    /// The current instant, truncated to microseconds.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time rendered in a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Wall clock in UTC.
    pub fn utc() -> Self {
        Self::with_offset(Utc.fix())
    }

    pub fn with_offset(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Wall clock at an offset given in seconds east of UTC.
    ///
    /// Returns `None` when the offset is a day or more.
    pub fn with_offset_seconds(seconds: i32) -> Option<Self> {
        FixedOffset::east_opt(seconds).map(Self::with_offset)
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::utc()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        truncate_to_micros(Utc::now().with_timezone(&self.offset))
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(Timestamp);

impl FixedClock {
    pub fn new(at: Timestamp) -> Self {
        Self(truncate_to_micros(at))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// A clock that advances by a fixed step on every reading.
#[derive(Debug)]
pub struct SteppingClock {
    next: Mutex<Timestamp>,
    step: Duration,
}

impl SteppingClock {
    pub fn new(start: Timestamp, step: Duration) -> Self {
        Self {
            next: Mutex::new(truncate_to_micros(start)),
            step,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> Timestamp {
        let mut next = self.next.lock().unwrap_or_else(|e| e.into_inner());
        let current = *next;
        *next = truncate_to_micros(current + self.step);
        current
    }
}

/// Drop sub-microsecond precision so a timestamp survives its text form.
pub fn truncate_to_micros(ts: Timestamp) -> Timestamp {
    let nanos = ts.nanosecond();
    ts.with_nanosecond(nanos - nanos % 1_000).unwrap_or(ts)
}

/// Render a timestamp in ISO-8601.
///
/// The fraction is omitted when zero and otherwise always six digits:
/// `2024-01-01T09:00:00+09:00`, `2024-01-01T09:00:00.250000+09:00`.
pub fn format_timestamp(ts: &Timestamp) -> String {
    if ts.nanosecond() / 1_000 == 0 {
        ts.to_rfc3339_opts(SecondsFormat::Secs, false)
    } else {
        ts.to_rfc3339_opts(SecondsFormat::Micros, false)
    }
}

/// Parse an ISO-8601 timestamp with an explicit offset.
pub fn parse_timestamp(s: &str) -> Result<Timestamp, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(truncate_to_micros)
}

/// Serde adapter storing timestamps as ISO-8601 strings.
pub mod iso8601 {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{format_timestamp, parse_timestamp, Timestamp};

    pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_timestamp(&s).map_err(serde::de::Error::custom)
    }
}
