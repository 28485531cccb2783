use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::calendar::{days_between, LocalDate};

/// One user's entry for a single calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    pub date: LocalDate,
    pub mood: i32,
    pub worked_out: bool,
    #[serde(default)]
    pub exercises: Vec<String>,
    #[serde(default)]
    pub drinks: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Row shape of the `daily_logs` table.
#[derive(Debug, FromRow)]
pub struct LogRow {
    pub date: NaiveDate,
    pub mood: i32,
    pub worked_out: bool,
    pub exercises: Vec<String>,
    pub drinks: i32,
    pub notes: Option<String>,
}

impl From<LogRow> for Log {
    fn from(row: LogRow) -> Self {
        Self {
            date: row.date.into(),
            mood: row.mood,
            worked_out: row.worked_out,
            exercises: row.exercises,
            drinks: row.drinks,
            notes: row.notes,
        }
    }
}

/// Half-open `[start, end)` span of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: LocalDate,
    pub end: LocalDate,
}

impl DateRange {
    pub fn new(start: LocalDate, end: LocalDate) -> Self {
        Self { start, end }
    }

    /// Range covering `first..=last`.
    pub fn inclusive(first: LocalDate, last: LocalDate) -> Self {
        Self::new(first, last.next_day())
    }

    pub fn contains(&self, date: LocalDate) -> bool {
        self.start <= date && date < self.end
    }

    pub fn len_days(&self) -> i64 {
        days_between(self.start, self.end).max(0)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertLogRequest {
    /// Defaults to today (server local time).
    pub date: Option<LocalDate>,

    /// Required on save; the form may still be in progress without it.
    #[validate(range(min = 1, max = 5, message = "Mood must be between 1 and 5"))]
    pub mood: Option<i32>,

    #[serde(default)]
    pub worked_out: bool,

    #[serde(default)]
    #[validate(length(max = 50, message = "At most 50 exercises per day"))]
    pub exercises: Vec<String>,

    #[serde(default)]
    #[validate(range(min = 0, max = 100, message = "Drinks must be between 0 and 100"))]
    pub drinks: i32,

    #[validate(length(max = 10000, message = "Notes must be under 10000 characters"))]
    pub notes: Option<String>,

    /// The caller's local day. Defaults to the server's.
    pub today: Option<LocalDate>,
}

/// Day navigator: step `delta` days from `date`, never past `today`.
#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: Option<LocalDate>,
    #[serde(default)]
    pub delta: i64,
    pub today: Option<LocalDate>,
}

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub start: Option<LocalDate>,
    /// Inclusive.
    pub end: Option<LocalDate>,
}
