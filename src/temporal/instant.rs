use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid instant '{0}' (expected YYYY-MM-DD)")]
pub struct ParseInstantError(pub String);

/// The unit by which an `Instant` is stepped forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Day,
    Month,
    Year,
}

/// A calendar date with day granularity.
///
/// Field order (year, month, day) makes the derived `Ord` chronological.
/// The canonical string form is `YYYY-MM-DD`; serde round-trips through it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Instant {
    year: i32,
    month: u8,
    day: u8,
}

impl Instant {
    pub fn new(year: i32, month: u8, day: u8) -> Result<Self, ParseInstantError> {
        if !(1..=12).contains(&month) || day < 1 || day > days_in_month(year, month) {
            return Err(ParseInstantError(format!(
                "{:04}-{:02}-{:02}",
                year, month, day
            )));
        }
        Ok(Self { year, month, day })
    }

    /// Constructs an instant from components known to be valid, for
    /// crate-internal constants.
    pub(crate) const fn from_parts_unchecked(year: i32, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    /// Returns this instant stepped forward by `n` cadence units.
    ///
    /// Month and year offsets clamp the day-of-month to the target month's
    /// length (e.g. Jan 31 + 1 month = Feb 28, or Feb 29 in a leap year).
    pub fn offset(&self, n: u32, cadence: Cadence) -> Instant {
        match cadence {
            Cadence::Day => {
                let mut current = *self;
                for _ in 0..n {
                    current = current.next_day();
                }
                current
            }
            Cadence::Month => {
                let months0 = self.year * 12 + i32::from(self.month) - 1 + n as i32;
                let year = months0.div_euclid(12);
                let month = (months0.rem_euclid(12) + 1) as u8;
                let day = self.day.min(days_in_month(year, month));
                Instant { year, month, day }
            }
            Cadence::Year => {
                let year = self.year + n as i32;
                let day = self.day.min(days_in_month(year, self.month));
                Instant {
                    year,
                    month: self.month,
                    day,
                }
            }
        }
    }

    fn next_day(&self) -> Instant {
        if self.day < days_in_month(self.year, self.month) {
            Instant {
                day: self.day + 1,
                ..*self
            }
        } else if self.month < 12 {
            Instant {
                year: self.year,
                month: self.month + 1,
                day: 1,
            }
        } else {
            Instant {
                year: self.year + 1,
                month: 1,
                day: 1,
            }
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn days_in_month(year: i32, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for Instant {
    type Err = ParseInstantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseInstantError(s.to_string());
        let mut parts = s.split('-');
        let year = parts.next().ok_or_else(err)?;
        let month = parts.next().ok_or_else(err)?;
        let day = parts.next().ok_or_else(err)?;
        if parts.next().is_some() || year.len() != 4 || month.len() != 2 || day.len() != 2 {
            return Err(err());
        }
        let year: i32 = year.parse().map_err(|_| err())?;
        let month: u8 = month.parse().map_err(|_| err())?;
        let day: u8 = day.parse().map_err(|_| err())?;
        Instant::new(year, month, day).map_err(|_| err())
    }
}

impl TryFrom<String> for Instant {
    type Error = ParseInstantError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Instant> for String {
    fn from(i: Instant) -> String {
        i.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn at(s: &str) -> Instant {
        s.parse().unwrap()
    }

    #[test]
    fn test_ordering_is_chronological() {
        assert!(at("2019-12-31") < at("2020-01-01"));
        assert!(at("2020-01-31") < at("2020-02-01"));
        assert!(at("2020-06-15") < at("2020-06-16"));
        assert_eq!(at("2020-06-15"), at("2020-06-15"));
    }

    #[rstest]
    #[case("2020-01-01", 1, Cadence::Month, "2020-02-01")]
    #[case("2020-01-01", 12, Cadence::Month, "2021-01-01")]
    #[case("2020-11-01", 3, Cadence::Month, "2021-02-01")]
    #[case("2020-01-31", 1, Cadence::Month, "2020-02-29")] // leap year clamp
    #[case("2021-01-31", 1, Cadence::Month, "2021-02-28")]
    #[case("2020-02-29", 1, Cadence::Year, "2021-02-28")]
    #[case("2020-01-01", 3, Cadence::Year, "2023-01-01")]
    #[case("2020-12-31", 1, Cadence::Day, "2021-01-01")]
    #[case("2020-02-28", 2, Cadence::Day, "2020-03-01")]
    fn test_offset(
        #[case] start: &str,
        #[case] n: u32,
        #[case] cadence: Cadence,
        #[case] expected: &str,
    ) {
        assert_eq!(at(start).offset(n, cadence), at(expected));
    }

    #[test]
    fn test_canonical_string_round_trip() {
        for s in ["2020-01-01", "1999-12-31", "2024-02-29"] {
            assert_eq!(at(s).to_string(), s);
        }
    }

    #[rstest]
    #[case("2020-13-01")] // month out of range
    #[case("2021-02-29")] // not a leap year
    #[case("2020-1-01")] // missing zero padding
    #[case("2020/01/01")]
    #[case("2020-01-01-01")]
    #[case("not-a-date")]
    #[case("")]
    fn test_parse_invalid(#[case] input: &str) {
        assert!(input.parse::<Instant>().is_err(), "should fail: '{}'", input);
    }

    #[test]
    fn test_cadence_deserializes_lowercase() {
        let c: Cadence = serde_json::from_str("\"month\"").unwrap();
        assert_eq!(c, Cadence::Month);
    }
}
