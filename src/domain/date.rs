//! Day-granular UTC dates used as forecast row keys.

use chrono::{NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DAY_IN_MILLIS: i64 = 86_400_000;

/// Milliseconds since the Unix epoch, truncated to midnight UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedDate(i64);

impl NormalizedDate {
    /// Normalize an arbitrary epoch-millis timestamp down to its UTC day.
    pub fn from_millis(ms: i64) -> Self {
        NormalizedDate(ms - ms.rem_euclid(DAY_IN_MILLIS))
    }

    /// Build from a calendar date. Returns None for out-of-range components.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self::from_naive_date)
    }

    pub fn from_naive_date(date: NaiveDate) -> Self {
        let millis = date
            .and_hms_opt(0, 0, 0)
            .map(|midnight| Utc.from_utc_datetime(&midnight).timestamp_millis())
            .unwrap_or(0);
        NormalizedDate(millis)
    }

    /// Today, according to the system clock.
    pub fn today() -> Self {
        Self::from_millis(Utc::now().timestamp_millis())
    }

    pub fn add_days(self, days: i64) -> Self {
        NormalizedDate(self.0 + days * DAY_IN_MILLIS)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    pub fn to_naive_date(&self) -> NaiveDate {
        Utc.timestamp_millis_opt(self.0)
            .single()
            .map(|dt| dt.date_naive())
            .unwrap_or_default()
    }
}

impl fmt::Display for NormalizedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_naive_date().format("%Y-%m-%d"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid date {0:?}, expected YYYY-MM-DD")]
pub struct DateParseError(pub String);

impl FromStr for NormalizedDate {
    type Err = DateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self::from_naive_date)
            .map_err(|_| DateParseError(s.to_string()))
    }
}

/// Source of "today" for anything that filters on the current day.
pub trait Clock: Send + Sync + fmt::Debug {
    fn today(&self) -> NormalizedDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NormalizedDate {
        NormalizedDate::today()
    }
}

/// Clock pinned to a single day.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NormalizedDate);

impl Clock for FixedClock {
    fn today(&self) -> NormalizedDate {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_millis_truncates_to_midnight() {
        let midnight = NormalizedDate::from_ymd(2024, 3, 10).unwrap();
        let afternoon = NormalizedDate::from_millis(midnight.as_millis() + 15 * 3_600_000);
        assert_eq!(afternoon, midnight);
        assert_eq!(midnight.as_millis() % DAY_IN_MILLIS, 0);
    }

    #[test]
    fn test_from_millis_before_epoch() {
        let d = NormalizedDate::from_millis(-1);
        assert_eq!(d.as_millis(), -DAY_IN_MILLIS);
        assert_eq!(d.to_string(), "1969-12-31");
    }

    #[test]
    fn test_add_days_crosses_month() {
        let d = NormalizedDate::from_ymd(2024, 2, 28).unwrap();
        assert_eq!(d.add_days(1).to_string(), "2024-02-29");
        assert_eq!(d.add_days(2).to_string(), "2024-03-01");
        assert_eq!(d.add_days(-28).to_string(), "2024-01-31");
    }

    #[test]
    fn test_parse_and_display() {
        let d: NormalizedDate = "2023-12-01".parse().unwrap();
        assert_eq!(d, NormalizedDate::from_ymd(2023, 12, 1).unwrap());
        assert_eq!(d.to_string(), "2023-12-01");
        assert!("2023-13-01".parse::<NormalizedDate>().is_err());
        assert!("yesterday".parse::<NormalizedDate>().is_err());
    }

    #[test]
    fn test_fixed_clock() {
        let d = NormalizedDate::from_ymd(2020, 1, 1).unwrap();
        assert_eq!(FixedClock(d).today(), d);
    }

    #[test]
    fn test_serializes_as_millis() {
        let d = NormalizedDate::from_ymd(1970, 1, 2).unwrap();
        assert_eq!(serde_json::to_string(&d).unwrap(), "86400000");
    }
}
