//! # Calendar arithmetic on local dates
//!
//! Every date in this service is a wall-clock calendar day. Dates are kept as
//! plain `(year, month0, day)` tuples and never pass through a UTC date-time,
//! so a log written at 23:30 in UTC-5 stays on the day the user picked.
//!
//! Months are 0-based everywhere in code and 1-based only in the ISO string.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Local, NaiveDate};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub const MONTH_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Years an ISO `YYYY-MM-DD` string can carry.
pub const MIN_YEAR: i32 = 0;
pub const MAX_YEAR: i32 = 9999;

pub const WEEKDAY_SHORT: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateParseError {
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    Malformed(String),

    #[error("Date '{0}' does not exist")]
    OutOfRange(String),
}

pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Number of days in `month0` (0 = January) of `year`.
pub fn days_in_month(year: i32, month0: u32) -> u32 {
    if month0 == 1 && is_leap_year(year) {
        29
    } else {
        DAYS_IN_MONTH[month0 as usize]
    }
}

/// A calendar day with no timezone attached.
///
/// The tuple is not validated on construction: the 31-row year grid needs to
/// name slots such as Feb 30. Use [`LocalDate::is_valid`] to check, and
/// [`LocalDate::normalized`] to roll an overflowing day into the next month.
/// Field order makes the derived `Ord` chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalDate {
    pub year: i32,
    pub month0: u32,
    pub day: u32,
}

impl LocalDate {
    pub const fn new(year: i32, month0: u32, day: u32) -> Self {
        Self { year, month0, day }
    }

    pub fn is_valid(&self) -> bool {
        self.month0 < 12 && self.day >= 1 && self.day <= days_in_month(self.year, self.month0)
    }

    /// The real day this slot names. Days past the end of the month roll
    /// into the next one; dates beyond chrono's range saturate.
    fn anchor(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month0.min(11) + 1, 1)
            .and_then(|first| first.checked_add_days(Days::new(u64::from(self.day.max(1) - 1))))
            .unwrap_or(if self.year < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
    }

    pub fn add_days(self, n: i64) -> Self {
        let base = self.anchor();
        let moved = if n >= 0 {
            base.checked_add_days(Days::new(n.unsigned_abs()))
        } else {
            base.checked_sub_days(Days::new(n.unsigned_abs()))
        };
        moved
            .unwrap_or(if n < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
            .into()
    }

    pub fn next_day(self) -> Self {
        self.add_days(1)
    }

    pub fn prev_day(self) -> Self {
        self.add_days(-1)
    }

    /// Rolls days past the end of the month forward (Feb 30 -> Mar 1 or 2).
    pub fn normalized(self) -> Self {
        self.anchor().into()
    }

    /// 0 = Sunday.
    pub fn weekday(self) -> u32 {
        self.anchor().weekday().num_days_from_sunday()
    }

    pub fn to_naive(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month0 + 1, self.day)
    }
}

impl From<NaiveDate> for LocalDate {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month0: date.month0(),
            day: date.day(),
        }
    }
}

impl fmt::Display for LocalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month0 + 1, self.day)
    }
}

impl FromStr for LocalDate {
    type Err = DateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || DateParseError::Malformed(s.to_string());

        let mut parts = s.split('-');
        let (Some(y), Some(m), Some(d), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };

        let year: i32 = y.parse().map_err(|_| malformed())?;
        let month: u32 = m.parse().map_err(|_| malformed())?;
        let day: u32 = d.parse().map_err(|_| malformed())?;

        if !(MIN_YEAR..=MAX_YEAR).contains(&year) || !(1..=12).contains(&month) {
            return Err(DateParseError::OutOfRange(s.to_string()));
        }
        let date = LocalDate::new(year, month - 1, day);
        if !date.is_valid() {
            return Err(DateParseError::OutOfRange(s.to_string()));
        }
        Ok(date)
    }
}

impl Serialize for LocalDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LocalDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

pub fn parse_local_date(iso: &str) -> Result<LocalDate, DateParseError> {
    iso.parse()
}

pub fn format_local_date(year: i32, month0: u32, day: u32) -> String {
    LocalDate::new(year, month0, day).to_string()
}

pub fn today_local() -> LocalDate {
    Local::now().date_naive().into()
}

pub fn today_local_string() -> String {
    today_local().to_string()
}

pub fn add_days(date: LocalDate, n: i64) -> LocalDate {
    date.add_days(n)
}

pub fn weekday_of(date: LocalDate) -> u32 {
    date.weekday()
}

/// First day of `month0` in `year`, where `month0` may run past either end of
/// the year (-1 is December of the previous year, 12 is January of the next).
pub fn first_of_month(year: i32, month0: i32) -> LocalDate {
    let total = i64::from(year) * 12 + i64::from(month0);
    let year = total
        .div_euclid(12)
        .clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
    LocalDate::new(year, total.rem_euclid(12) as u32, 1)
}

pub fn days_between(start: LocalDate, end: LocalDate) -> i64 {
    end.anchor().signed_duration_since(start.anchor()).num_days()
}

/// Day navigator step: moves by `delta` days but never past `today`.
pub fn step_day(selected: LocalDate, delta: i64, today: LocalDate) -> LocalDate {
    let next = selected.add_days(delta);
    if next > today {
        selected.min(today)
    } else {
        next
    }
}
