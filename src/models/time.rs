//! Time-of-day, period, and day-qualified slot models.
//!
//! # Time Model
//! Times of day are `chrono::NaiveTime` values serialized as `"HH:MM"`.
//! Days are zero-based indices into the configured week (0 = first day).
//!
//! All intervals are half-open `[start, end)`: a period ending at 10:00
//! does not intersect one starting at 10:00.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parses a time of day in `HH:MM` or `HH:MM:SS` form.
pub fn parse_clock(raw: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(raw, "%H:%M").or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
}

/// Serde adapter for `"HH:MM"` times of day.
pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_clock(&raw).map_err(serde::de::Error::custom)
    }
}

/// A time-of-day interval `[start_time, end_time)` without a day.
///
/// This is the wire `slot` object of an entry, and the shape of
/// break periods that apply on every day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    /// Start time (inclusive).
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    /// End time (exclusive).
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

impl Period {
    /// Creates a new period.
    pub fn new(start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    /// Parses a period from two `HH:MM` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self::new(parse_clock(start)?, parse_clock(end)?))
    }

    /// Whether `start_time < end_time`.
    #[inline]
    pub fn is_well_formed(&self) -> bool {
        self.start_time < self.end_time
    }

    /// Length in minutes (zero or negative for malformed periods).
    #[inline]
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    /// Whether two periods overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_time < other.end_time && other.start_time < self.end_time
    }

    /// Whether `other` lies entirely within this period.
    pub fn covers(&self, other: &Self) -> bool {
        self.start_time <= other.start_time && other.end_time <= self.end_time
    }

    /// Qualifies this period with a day.
    pub fn on_day(self, day: u8) -> TimeSlot {
        TimeSlot::new(day, self.start_time, self.end_time)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }
}

/// A day-qualified interval within the week.
///
/// Two slots are equal iff they share the day and the start/end pair.
/// Ordering is `(day, start_time, end_time)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Zero-based day index.
    pub day: u8,
    /// Start time (inclusive).
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    /// End time (exclusive).
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

impl TimeSlot {
    /// Creates a new slot.
    pub fn new(day: u8, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            day,
            start_time,
            end_time,
        }
    }

    /// Parses a slot from a day and two `HH:MM` strings.
    pub fn parse(day: u8, start: &str, end: &str) -> Result<Self, chrono::ParseError> {
        Ok(Period::parse(start, end)?.on_day(day))
    }

    /// The day-less period of this slot.
    #[inline]
    pub fn period(&self) -> Period {
        Period::new(self.start_time, self.end_time)
    }

    /// Length in minutes.
    #[inline]
    pub fn duration_minutes(&self) -> i64 {
        self.period().duration_minutes()
    }

    /// Whether two slots overlap in time on the same day.
    pub fn intersects(&self, other: &Self) -> bool {
        self.day == other.day && self.period().overlaps(&other.period())
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day {} {}", self.day, self.period())
    }
}
