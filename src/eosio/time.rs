//! Chain time types and their ISO-8601 string forms (UTC, no zone suffix).

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Milliseconds between the Unix epoch and the block timestamp epoch (2000-01-01).
const BLOCK_TIMESTAMP_EPOCH_MS: i64 = 946_684_800_000;
const BLOCK_INTERVAL_MS: i64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("invalid timestamp '{0}'")]
    Invalid(String),

    #[error("timestamp '{0}' is out of range")]
    OutOfRange(String),
}

fn parse_utc_millis(s: &str) -> Result<i64, TimeError> {
    let trimmed = s.trim().trim_end_matches('Z');
    let parsed = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|_| TimeError::Invalid(s.to_string()))?;
    Ok(parsed.and_utc().timestamp_millis())
}

fn format_utc_millis(ms: i64, with_millis: bool) -> String {
    match DateTime::from_timestamp_millis(ms) {
        Some(dt) if with_millis => dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
        Some(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        None => ms.to_string(),
    }
}

/// Seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimePointSec(pub u32);

impl TimePointSec {
    pub fn seconds(self) -> u32 {
        self.0
    }

    pub fn checked_add_secs(self, secs: u32) -> Option<Self> {
        self.0.checked_add(secs).map(Self)
    }
}

impl FromStr for TimePointSec {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let secs = parse_utc_millis(s)?.div_euclid(1000);
        u32::try_from(secs)
            .map(Self)
            .map_err(|_| TimeError::OutOfRange(s.to_string()))
    }
}

impl fmt::Display for TimePointSec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_utc_millis(i64::from(self.0) * 1000, false))
    }
}

/// Microseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimePoint(pub i64);

impl FromStr for TimePoint {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_utc_millis(s)?
            .checked_mul(1000)
            .map(Self)
            .ok_or_else(|| TimeError::OutOfRange(s.to_string()))
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_utc_millis(self.0.div_euclid(1000), true))
    }
}

/// Half-second slots since 2000-01-01T00:00:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BlockTimestamp(pub u32);

impl BlockTimestamp {
    /// Whole seconds since the Unix epoch, rounded down.
    pub fn to_time_point_sec(self) -> TimePointSec {
        let ms = BLOCK_TIMESTAMP_EPOCH_MS + i64::from(self.0) * BLOCK_INTERVAL_MS;
        TimePointSec((ms / 1000) as u32)
    }
}

impl FromStr for BlockTimestamp {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slots = (parse_utc_millis(s)? - BLOCK_TIMESTAMP_EPOCH_MS).div_euclid(BLOCK_INTERVAL_MS);
        u32::try_from(slots)
            .map(Self)
            .map_err(|_| TimeError::OutOfRange(s.to_string()))
    }
}

impl fmt::Display for BlockTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = BLOCK_TIMESTAMP_EPOCH_MS + i64::from(self.0) * BLOCK_INTERVAL_MS;
        f.write_str(&format_utc_millis(ms, true))
    }
}

macro_rules! string_serde {
    ($($ty:ty),*) => {$(
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    )*};
}

string_serde!(TimePointSec, TimePoint, BlockTimestamp);
