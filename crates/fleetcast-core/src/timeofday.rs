//! Minute-of-day arithmetic.
//!
//! Every schedule time in the system is a wall-clock `"HH:MM"` with no date
//! attached. [`MinuteOfDay`] keeps that as minutes since midnight (0..1440)
//! so offset addition and midnight wraparound are plain modular arithmetic
//! instead of string surgery.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FleetcastError;

pub const MINUTES_PER_DAY: i32 = 1440;

/// A wall-clock time of day at minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MinuteOfDay(u16);

impl MinuteOfDay {
    /// Build from an absolute minute count. Values outside a day are wrapped.
    pub fn from_minutes(minutes: i32) -> Self {
        Self(minutes.rem_euclid(MINUTES_PER_DAY) as u16)
    }

    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        if hour <= 23 && minute <= 59 {
            Some(Self((hour * 60 + minute) as u16))
        } else {
            None
        }
    }

    /// Minutes since midnight, always in `0..1440`.
    pub fn minutes(&self) -> i32 {
        self.0 as i32
    }

    pub fn hour(&self) -> u32 {
        (self.0 / 60) as u32
    }

    pub fn minute(&self) -> u32 {
        (self.0 % 60) as u32
    }

    /// Add a signed minute offset, wrapping past midnight in either direction.
    pub fn add_minutes(&self, offset: i32) -> Self {
        Self::from_minutes(self.minutes() + offset)
    }
}

impl fmt::Display for MinuteOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for MinuteOfDay {
    type Err = FleetcastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FleetcastError::InvalidTime {
            value: s.to_string(),
        };

        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour: u32 = h.parse().map_err(|_| invalid())?;
        let minute: u32 = m.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).ok_or_else(invalid)
    }
}

impl TryFrom<String> for MinuteOfDay {
    type Error = FleetcastError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MinuteOfDay> for String {
    fn from(t: MinuteOfDay) -> Self {
        t.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays() {
        let t: MinuteOfDay = "08:05".parse().unwrap();
        assert_eq!(t.minutes(), 485);
        assert_eq!(t.to_string(), "08:05");
    }

    #[test]
    fn rejects_malformed_strings() {
        for bad in ["", "8", "24:00", "12:60", "ab:cd", "12-30"] {
            assert!(bad.parse::<MinuteOfDay>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn offset_wraps_past_midnight() {
        let base: MinuteOfDay = "23:50".parse().unwrap();
        assert_eq!(base.add_minutes(30).to_string(), "00:20");
    }

    #[test]
    fn negative_offset_wraps_backwards() {
        let base: MinuteOfDay = "00:10".parse().unwrap();
        assert_eq!(base.add_minutes(-30).to_string(), "23:40");
    }

    #[test]
    fn large_offsets_stay_in_range() {
        let base: MinuteOfDay = "12:00".parse().unwrap();
        let shifted = base.add_minutes(3 * MINUTES_PER_DAY + 15);
        assert_eq!(shifted.to_string(), "12:15");
    }
}
