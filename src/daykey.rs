//! Canonical calendar-day keys.
//!
//! Every date comparison in the tracker goes through [`DayKey`], a calendar
//! day with no time of day attached. Its textual form is `YYYY-MM-DD`, and
//! ordering matches both the chronological and the lexicographic order of
//! that text.

use crate::errors::CoreError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Offset used for "today" when nothing else is configured (KST).
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;

const KEY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// The following calendar day.
    pub fn succ(&self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }

    /// The preceding calendar day.
    pub fn pred(&self) -> Option<Self> {
        self.0.pred_opt().map(Self)
    }

    pub fn offset_days(&self, days: i64) -> Option<Self> {
        self.0.checked_add_signed(Duration::days(days)).map(Self)
    }

    /// Whole days from `self` to `later`; negative when `later` is earlier.
    pub fn days_until(&self, later: DayKey) -> i64 {
        (later.0 - self.0).num_days()
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(KEY_FORMAT))
    }
}

impl FromStr for DayKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s)
    }
}

impl TryFrom<String> for DayKey {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        normalize(&value)
    }
}

impl From<DayKey> for String {
    fn from(key: DayKey) -> Self {
        key.to_string()
    }
}

/// Validates a `YYYY-MM-DD` string and returns its day key.
///
/// The input must have exactly that shape (four-digit year, two-digit month
/// and day, ASCII digits only) and name a real calendar day. Canonical input
/// passes through unchanged; no timezone shift is applied.
pub fn normalize(input: &str) -> Result<DayKey, CoreError> {
    if !has_key_shape(input) {
        return Err(CoreError::InvalidFormat(input.to_string()));
    }

    let year: i32 = parse_digits(&input[0..4]);
    let month: u32 = parse_digits(&input[5..7]) as u32;
    let day: u32 = parse_digits(&input[8..10]) as u32;

    DayKey::from_ymd(year, month, day).ok_or_else(|| CoreError::InvalidDate(input.to_string()))
}

/// Day difference `end - start` in whole calendar days.
pub fn day_difference(end: DayKey, start: DayKey) -> i64 {
    start.days_until(end)
}

/// Today's key as observed at a fixed offset from UTC.
pub fn today_key(offset_hours: i32) -> DayKey {
    today_key_at(Utc::now(), offset_hours)
}

pub fn today_key_at(now: DateTime<Utc>, offset_hours: i32) -> DayKey {
    let shifted = now + Duration::hours(i64::from(offset_hours));
    DayKey(shifted.date_naive())
}

/// Offsets in use by real-world zones span UTC-12 to UTC+14.
pub fn is_valid_offset(offset_hours: i32) -> bool {
    (-12..=14).contains(&offset_hours)
}

fn has_key_shape(input: &str) -> bool {
    let bytes = input.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(idx, byte)| match idx {
            4 | 7 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        })
}

// Only called on ASCII digit runs of length <= 4.
fn parse_digits(digits: &str) -> i32 {
    digits
        .bytes()
        .fold(0, |acc, byte| acc * 10 + i32::from(byte - b'0'))
}
