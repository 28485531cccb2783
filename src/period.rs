//! # Period aggregation
//!
//! Resolves a `(kind, offset)` view window into a concrete date range, picks
//! the logs inside it and computes the numbers the insights screen shows.
//! The label and the data always come from the same resolved range.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::calendar::{first_of_month, LocalDate, MONTH_NAMES, MONTH_SHORT, WEEKDAY_SHORT};
use crate::models::log::{DateRange, Log};

/// Day count used for "unrecorded" in a year view. Not leap-adjusted.
const YEAR_DAYS: i64 = 365;
const WEEK_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    #[default]
    Week,
    Month,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewWindow {
    pub kind: ViewKind,
    #[serde(default)]
    pub offset: i32,
}

impl ViewWindow {
    pub fn new(kind: ViewKind, offset: i32) -> Self {
        Self { kind, offset }
    }

    /// Switching view always returns to the current period.
    pub fn switch_to(self, kind: ViewKind) -> Self {
        Self::new(kind, 0)
    }

    pub fn previous(self) -> Self {
        Self::new(self.kind, self.offset - 1)
    }

    pub fn next(self) -> Self {
        Self::new(self.kind, self.offset + 1)
    }

    pub fn resolve(self, now: LocalDate) -> DateRange {
        resolve_window(self.kind, self.offset, now)
    }
}

/// Half-open range for a view window anchored on `now`.
///
/// Weeks are the rolling seven days ending with `now`, not Sunday-aligned.
/// Months and years start on the first day of the shifted period.
pub fn resolve_window(kind: ViewKind, offset: i32, now: LocalDate) -> DateRange {
    match kind {
        ViewKind::Week => {
            let end = now.add_days(1 + i64::from(offset) * WEEK_DAYS);
            DateRange::new(end.add_days(-WEEK_DAYS), end)
        }
        ViewKind::Month => {
            let start = first_of_month(now.year, (now.month0 as i32).saturating_add(offset));
            let end = first_of_month(start.year, start.month0 as i32 + 1);
            DateRange::new(start, end)
        }
        ViewKind::Year => {
            let start = first_of_month(now.year, offset.saturating_mul(12));
            DateRange::new(start, first_of_month(start.year, 12))
        }
    }
}

/// Logs inside `range`, ascending by date. Stable, so ties keep input order.
pub fn filter_and_sort(logs: &[Log], range: DateRange) -> Vec<&Log> {
    let mut picked: Vec<&Log> = logs.iter().filter(|log| range.contains(log.date)).collect();
    picked.sort_by_key(|log| log.date);
    picked
}

fn short_date(date: LocalDate) -> String {
    format!("{} {}", MONTH_SHORT[date.month0 as usize], date.day)
}

/// "Jan 5 – Jan 12, 2025", or with both years when they differ.
fn span_label(first: LocalDate, last: LocalDate) -> String {
    if first.year == last.year {
        format!("{} – {}, {}", short_date(first), short_date(last), last.year)
    } else {
        format!(
            "{}, {} – {}, {}",
            short_date(first),
            first.year,
            short_date(last),
            last.year
        )
    }
}

pub fn period_label(kind: ViewKind, offset: i32, now: LocalDate) -> String {
    let range = resolve_window(kind, offset, now);
    match kind {
        ViewKind::Week => span_label(range.start, range.end.prev_day()),
        ViewKind::Month => format!(
            "{} {}",
            MONTH_NAMES[range.start.month0 as usize],
            range.start.year
        ),
        ViewKind::Year => range.start.year.to_string(),
    }
}

/// Mean mood, 0.0 for an empty set.
pub fn average_mood(logs: &[&Log]) -> f64 {
    if logs.is_empty() {
        return 0.0;
    }
    let sum: i64 = logs.iter().map(|log| log.mood as i64).sum();
    sum as f64 / logs.len() as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExerciseStats {
    pub yes: u32,
    pub no: u32,
    pub unrecorded: u32,
    pub percentage: u32,
}

/// Days a window is measured against: 7, the month's length, or 365.
pub fn total_days(kind: ViewKind, range: DateRange) -> i64 {
    match kind {
        ViewKind::Week => WEEK_DAYS,
        ViewKind::Month => range.len_days(),
        ViewKind::Year => YEAR_DAYS,
    }
}

pub fn exercise_stats(logs: &[&Log], kind: ViewKind, offset: i32, now: LocalDate) -> ExerciseStats {
    let range = resolve_window(kind, offset, now);
    exercise_stats_over(logs, total_days(kind, range))
}

/// `unrecorded` is floored at zero: a fully logged leap year would otherwise
/// go to -1 against the 365-day basis.
pub fn exercise_stats_over(logs: &[&Log], total_days: i64) -> ExerciseStats {
    let yes = logs.iter().filter(|log| log.worked_out).count() as u32;
    let no = logs.len() as u32 - yes;
    let unrecorded = (total_days - logs.len() as i64).max(0) as u32;
    let percentage = if logs.is_empty() {
        0
    } else {
        (yes as f64 / logs.len() as f64 * 100.0).round() as u32
    };

    ExerciseStats {
        yes,
        no,
        unrecorded,
        percentage,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrinkTotals {
    pub total: i64,
    pub average: f64,
    pub alcohol_free_days: u32,
}

pub fn drink_totals(logs: &[&Log]) -> DrinkTotals {
    let total: i64 = logs.iter().map(|log| log.drinks.max(0) as i64).sum();
    let average = if logs.is_empty() {
        0.0
    } else {
        total as f64 / logs.len() as f64
    };
    DrinkTotals {
        total,
        average,
        alcohol_free_days: logs.iter().filter(|log| log.drinks <= 0).count() as u32,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: LocalDate,
    pub label: String,
    pub mood: i32,
    pub drinks: i32,
    pub worked_out: bool,
}

/// One chart point per log. Week views prefix the weekday ("Mon, Jan 5").
pub fn chart_series(logs: &[&Log], kind: ViewKind) -> Vec<SeriesPoint> {
    logs.iter()
        .map(|log| {
            let label = match kind {
                ViewKind::Week => format!(
                    "{}, {}",
                    WEEKDAY_SHORT[log.date.weekday() as usize],
                    short_date(log.date)
                ),
                ViewKind::Month | ViewKind::Year => short_date(log.date),
            };
            SeriesPoint {
                date: log.date,
                label,
                mood: log.mood,
                drinks: log.drinks,
                worked_out: log.worked_out,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Streaks {
    pub current: u32,
    pub longest: u32,
}

/// Consecutive worked-out days. The current streak counts back from today,
/// or from yesterday while today has not been logged as a workout yet.
/// Days after `today` are ignored.
pub fn workout_streaks(logs: &[Log], today: LocalDate) -> Streaks {
    let days: BTreeSet<LocalDate> = logs
        .iter()
        .filter(|log| log.worked_out && log.date <= today)
        .map(|log| log.date)
        .collect();

    let mut current = 0;
    let mut check = if days.contains(&today) {
        today
    } else {
        today.prev_day()
    };
    while days.contains(&check) {
        current += 1;
        check = check.prev_day();
    }

    let mut longest = 0;
    let mut run = 0;
    let mut prev: Option<LocalDate> = None;
    for &date in &days {
        run = match prev {
            Some(p) if p.next_day() == date => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(date);
    }

    Streaks { current, longest }
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<ViewWindow>,
    pub label: String,
    pub range: DateRange,
    pub log_count: usize,
    /// Rounded to one decimal.
    pub average_mood: f64,
    pub exercise: ExerciseStats,
    pub drinks: DrinkTotals,
    pub series: Vec<SeriesPoint>,
}

pub fn summarize(logs: &[Log], window: ViewWindow, now: LocalDate) -> PeriodSummary {
    let range = window.resolve(now);
    let picked = filter_and_sort(logs, range);

    PeriodSummary {
        window: Some(window),
        label: period_label(window.kind, window.offset, now),
        range,
        log_count: picked.len(),
        average_mood: round1(average_mood(&picked)),
        exercise: exercise_stats_over(&picked, total_days(window.kind, range)),
        drinks: drink_totals(&picked),
        series: chart_series(&picked, window.kind),
    }
}

/// Summary over an arbitrary range, measured against its own length.
pub fn summarize_range(logs: &[Log], range: DateRange) -> PeriodSummary {
    let picked = filter_and_sort(logs, range);

    PeriodSummary {
        window: None,
        label: span_label(range.start, range.end.prev_day()),
        range,
        log_count: picked.len(),
        average_mood: round1(average_mood(&picked)),
        exercise: exercise_stats_over(&picked, range.len_days()),
        drinks: drink_totals(&picked),
        series: chart_series(&picked, ViewKind::Month),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
