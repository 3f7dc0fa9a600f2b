// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the implementation of `DateTime`.

use std::{
    cmp::Ordering,
    fmt,
    ops::{Add, Sub},
};

use chrono::{Duration, TimeZone, Utc};

pub type DateTimeUtc = chrono::DateTime<Utc>;

/// A UTC date/time value. This is a wrapper around the chrono type used for the timestamps of
/// data values and notification messages.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
pub struct DateTime {
    date_time: DateTimeUtc,
}

impl Default for DateTime {
    fn default() -> Self {
        DateTime::epoch()
    }
}

impl Add<Duration> for DateTime {
    type Output = Self;

    fn add(self, duration: Duration) -> Self {
        DateTime::from(self.date_time + duration)
    }
}

impl Sub<DateTime> for DateTime {
    type Output = Duration;

    fn sub(self, other: Self) -> Duration {
        self.date_time - other.date_time
    }
}

impl Sub<Duration> for DateTime {
    type Output = Self;

    fn sub(self, duration: Duration) -> Self {
        DateTime::from(self.date_time - duration)
    }
}

impl PartialOrd for DateTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DateTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.date_time.cmp(&other.date_time)
    }
}

impl From<DateTimeUtc> for DateTime {
    fn from(date_time: DateTimeUtc) -> Self {
        DateTime { date_time }
    }
}

impl From<DateTime> for DateTimeUtc {
    fn from(value: DateTime) -> Self {
        value.date_time
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date_time.to_rfc3339())
    }
}

impl DateTime {
    /// Constructs from the current time
    pub fn now() -> DateTime {
        DateTime::from(Utc::now())
    }

    /// Constructs from the current time with an offset
    pub fn now_with_offset(offset: Duration) -> DateTime {
        DateTime::from(Utc::now() + offset)
    }

    /// The OPC UA epoch, 1601-01-01 00:00:00 UTC. A timestamp equal to it means "not set".
    pub fn epoch() -> DateTime {
        DateTime::from(
            Utc.with_ymd_and_hms(1601, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
        )
    }

    pub fn is_null(&self) -> bool {
        *self == DateTime::epoch()
    }

    /// Returns the time in the chrono representation
    pub fn as_chrono(&self) -> DateTimeUtc {
        self.date_time
    }
}

#[test]
fn date_time_arithmetic() {
    let now = DateTime::now();
    let later = now + Duration::milliseconds(1500);
    assert!(later > now);
    assert_eq!((later - now).num_milliseconds(), 1500);
    assert_eq!(later - Duration::milliseconds(1500), now);
    assert!(DateTime::default().is_null());
    assert!(!now.is_null());
}
