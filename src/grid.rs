//! # Calendar grids
//!
//! Turns a sparse set of logs into fully populated cell grids for the
//! history views. Every layout the clients draw comes from here:
//!
//! - month grid: week rows x 7 weekday columns, `None` padding around the month
//! - year grid: 12 month columns x 31 day slots, slots past month end invalid
//! - activity grid: Sunday-first week columns spanning a whole year
//! - timelines: stacked month grids walking back from an anchor month
//!
//! Cells carry the flags the client needs to decide what is clickable, and
//! the colour bucket for the active metric. Styling stays on the client.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::calendar::{
    days_between, days_in_month, first_of_month, weekday_of, LocalDate, MONTH_NAMES, MONTH_SHORT,
};
use crate::models::log::Log;

pub const MOOD_LABELS: [&str; 5] = ["Awful", "Bad", "Okay", "Good", "Great"];

/// Slots per year-grid column.
const YEAR_GRID_ROWS: u32 = 31;

/// Bounds on the number of stacked months in a timeline.
const TIMELINE_MIN_MONTHS: i32 = 12;
const TIMELINE_MAX_MONTHS: i32 = 60;

pub fn mood_label(mood: i32) -> Option<&'static str> {
    usize::try_from(mood - 1)
        .ok()
        .and_then(|i| MOOD_LABELS.get(i).copied())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Mood,
    Workout,
    Alcohol,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegendEntry {
    pub bucket: u8,
    pub label: String,
}

impl Metric {
    /// Colour bucket for a day. Defined for every input: no log is bucket 0,
    /// moods outside 1..=5 are clamped, drinks above 5 share the top bucket.
    pub fn bucket(self, log: Option<&Log>) -> u8 {
        let Some(log) = log else { return 0 };
        match self {
            Metric::Mood => log.mood.clamp(0, 5) as u8,
            Metric::Workout => u8::from(log.worked_out),
            Metric::Alcohol => log.drinks.clamp(0, 5) as u8,
        }
    }

    /// Number of distinct buckets, including the empty one.
    pub fn bucket_count(self) -> u8 {
        match self {
            Metric::Mood | Metric::Alcohol => 6,
            Metric::Workout => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Mood => "Mood",
            Metric::Workout => "Exercise",
            Metric::Alcohol => "Alcohol",
        }
    }

    pub fn legend(self) -> Vec<LegendEntry> {
        let entry = |bucket: u8, label: &str| LegendEntry {
            bucket,
            label: label.to_string(),
        };
        match self {
            Metric::Mood => (1..=5u8)
                .map(|m| entry(m, MOOD_LABELS[m as usize - 1]))
                .collect(),
            Metric::Workout => vec![entry(0, "No"), entry(1, "Yes")],
            Metric::Alcohol => (0..=5u8)
                .map(|d| {
                    if d == 5 {
                        entry(d, "5+")
                    } else {
                        entry(d, &d.to_string())
                    }
                })
                .collect(),
        }
    }

    fn tooltip(self, date: LocalDate, log: &Log) -> String {
        match self {
            Metric::Mood => match mood_label(log.mood) {
                Some(label) => format!("{}: {}", date, label),
                None => format!("{}: Mood {}", date, log.mood),
            },
            Metric::Workout => {
                format!("{}: {}", date, if log.worked_out { "Yes" } else { "No" })
            }
            Metric::Alcohol => format!(
                "{}: {} {}",
                date,
                log.drinks,
                if log.drinks == 1 { "drink" } else { "drinks" }
            ),
        }
    }
}

/// Date -> log lookup. Later entries for the same date win.
#[derive(Debug, Default)]
pub struct LogIndex<'a> {
    by_date: HashMap<LocalDate, &'a Log>,
}

impl<'a> LogIndex<'a> {
    pub fn new(logs: &'a [Log]) -> Self {
        Self {
            by_date: logs.iter().map(|log| (log.date, log)).collect(),
        }
    }

    pub fn get(&self, date: LocalDate) -> Option<&'a Log> {
        self.by_date.get(&date).copied()
    }

    pub fn earliest(&self) -> Option<LocalDate> {
        self.by_date.keys().min().copied()
    }
}

/// Inputs owned by the caller: what day it is, what is selected, what to colour by.
#[derive(Debug, Clone, Copy)]
pub struct GridContext {
    pub today: LocalDate,
    pub selected: Option<LocalDate>,
    pub metric: Metric,
}

#[derive(Debug, Clone, Serialize)]
pub struct Cell<'a> {
    pub date: LocalDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<&'a Log>,
    pub is_valid: bool,
    pub is_current_period: bool,
    pub is_future: bool,
    pub is_selected: bool,
    pub interactive: bool,
    pub bucket: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
}

impl<'a> Cell<'a> {
    fn new(date: LocalDate, is_current_period: bool, index: &LogIndex<'a>, ctx: &GridContext) -> Self {
        let is_valid = date.is_valid();
        let log = if is_valid { index.get(date) } else { None };
        let is_future = date.normalized() > ctx.today;
        let is_selected = is_valid && ctx.selected == Some(date);
        let tooltip = match log {
            Some(log) if !is_future && is_current_period => Some(ctx.metric.tooltip(date, log)),
            _ => None,
        };

        Self {
            date,
            log,
            is_valid,
            is_current_period,
            is_future,
            is_selected,
            interactive: is_valid && is_current_period && !is_future,
            bucket: ctx.metric.bucket(log),
            tooltip,
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.is_valid && self.is_current_period && !self.is_future
    }

    /// Runs `on_select` with this cell's date if the cell may be selected.
    /// Disabled cells never fire the callback.
    pub fn select<F: FnOnce(LocalDate)>(&self, on_select: F) -> bool {
        if !self.is_interactive() {
            return false;
        }
        on_select(self.date);
        true
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthGrid<'a> {
    pub year: i32,
    pub month0: u32,
    pub label: String,
    pub weeks: Vec<[Option<Cell<'a>>; 7]>,
}

impl<'a> MonthGrid<'a> {
    pub fn cells(&self) -> impl Iterator<Item = &Cell<'a>> + '_ {
        self.weeks.iter().flat_map(|week| week.iter().flatten())
    }
}

/// Week rows for one month. Panics if `month0 > 11`.
pub fn build_month_grid<'a>(
    year: i32,
    month0: u32,
    index: &LogIndex<'a>,
    ctx: &GridContext,
) -> MonthGrid<'a> {
    assert!(month0 < 12, "month index out of range: {}", month0);

    let first = LocalDate::new(year, month0, 1);
    let offset = weekday_of(first);
    let days = days_in_month(year, month0);
    let rows = (offset + days).div_ceil(7);

    let weeks: Vec<[Option<Cell<'a>>; 7]> = (0..rows)
        .map(|row| {
            std::array::from_fn(|col| {
                let slot = row * 7 + col as u32;
                if slot < offset || slot >= offset + days {
                    None
                } else {
                    let date = LocalDate::new(year, month0, slot - offset + 1);
                    Some(Cell::new(date, true, index, ctx))
                }
            })
        })
        .collect();

    MonthGrid {
        year,
        month0,
        label: MonthCursor::new(year, month0).label(),
        weeks,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthColumn<'a> {
    pub month0: u32,
    pub label: &'static str,
    pub days: u32,
    pub cells: Vec<Cell<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearGrid<'a> {
    pub year: i32,
    pub columns: Vec<MonthColumn<'a>>,
}

/// Twelve month columns of 31 slots each.
pub fn build_year_grid<'a>(year: i32, index: &LogIndex<'a>, ctx: &GridContext) -> YearGrid<'a> {
    let columns = (0..12)
        .map(|month0| {
            let cells = (1..=YEAR_GRID_ROWS)
                .map(|day| {
                    let date = LocalDate::new(year, month0, day);
                    let in_year = date.normalized().year == year;
                    Cell::new(date, in_year, index, ctx)
                })
                .collect();
            MonthColumn {
                month0,
                label: MONTH_SHORT[month0 as usize],
                days: days_in_month(year, month0),
                cells,
            }
        })
        .collect();

    YearGrid { year, columns }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthStart {
    pub month0: u32,
    pub label: &'static str,
    pub week: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityGrid<'a> {
    pub year: i32,
    /// Week columns, Sunday first.
    pub weeks: Vec<[Cell<'a>; 7]>,
    pub month_starts: Vec<MonthStart>,
}

/// Sunday-first week columns from the week holding Jan 1 through the week
/// holding Dec 31. Padding days from neighbouring years are out of period.
pub fn build_activity_grid<'a>(year: i32, index: &LogIndex<'a>, ctx: &GridContext) -> ActivityGrid<'a> {
    let jan1 = LocalDate::new(year, 0, 1);
    let dec31 = LocalDate::new(year, 11, 31);
    let start = jan1.add_days(-(weekday_of(jan1) as i64));
    let last = dec31.add_days(6 - weekday_of(dec31) as i64);
    let week_count = (days_between(start, last) + 1) / 7;

    let weeks: Vec<[Cell<'a>; 7]> = (0..week_count)
        .map(|week| {
            std::array::from_fn(|dow| {
                let date = start.add_days(week * 7 + dow as i64);
                Cell::new(date, date.year == year, index, ctx)
            })
        })
        .collect();

    let month_starts = (0..12u32)
        .map(|month0| MonthStart {
            month0,
            label: MONTH_SHORT[month0 as usize],
            week: (days_between(start, LocalDate::new(year, month0, 1)) / 7) as u32,
        })
        .collect();

    ActivityGrid {
        year,
        weeks,
        month_starts,
    }
}

/// Month navigator position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct MonthCursor {
    pub year: i32,
    pub month0: u32,
}

impl MonthCursor {
    pub fn new(year: i32, month0: u32) -> Self {
        Self { year, month0 }
    }

    pub fn containing(date: LocalDate) -> Self {
        Self::new(date.year, date.month0)
    }

    pub fn shift(self, months: i32) -> Self {
        let first = first_of_month(self.year, self.month0 as i32 + months);
        Self::new(first.year, first.month0)
    }

    pub fn prev(self) -> Self {
        self.shift(-1)
    }

    /// `None` once the cursor sits on the month containing `today`.
    pub fn next(self, today: LocalDate) -> Option<Self> {
        if self >= Self::containing(today) {
            None
        } else {
            Some(self.shift(1))
        }
    }

    /// "June 2025"
    pub fn label(self) -> String {
        format!("{} {}", MONTH_NAMES[self.month0 as usize], self.year)
    }
}

/// `count` months ending at `anchor`, most recent first.
pub fn months_back(anchor: MonthCursor, count: i32) -> Vec<MonthCursor> {
    (0..count.max(0)).map(|i| anchor.shift(-i)).collect()
}

/// Months to stack for the scrolling year view: back to the earliest log,
/// but never fewer than 12 nor more than 60.
pub fn timeline_months(earliest: Option<LocalDate>, anchor: MonthCursor) -> Vec<MonthCursor> {
    let count = match earliest {
        None => TIMELINE_MIN_MONTHS,
        Some(first) => {
            let diff = (i64::from(anchor.year) - i64::from(first.year)) * 12
                + (i64::from(anchor.month0) - i64::from(first.month0));
            (diff + 1).clamp(i64::from(TIMELINE_MIN_MONTHS), i64::from(TIMELINE_MAX_MONTHS)) as i32
        }
    };
    months_back(anchor, count)
}

pub fn build_timeline<'a>(
    anchor: MonthCursor,
    index: &LogIndex<'a>,
    ctx: &GridContext,
) -> Vec<MonthGrid<'a>> {
    timeline_months(index.earliest(), anchor)
        .into_iter()
        .map(|m| build_month_grid(m.year, m.month0, index, ctx))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> LocalDate {
        s.parse().unwrap()
    }

    fn log(date: &str, mood: i32, worked_out: bool, drinks: i32) -> Log {
        Log {
            date: d(date),
            mood,
            worked_out,
            exercises: vec![],
            drinks,
            notes: None,
        }
    }

    fn ctx(today: &str, selected: Option<&str>, metric: Metric) -> GridContext {
        GridContext {
            today: d(today),
            selected: selected.map(d),
            metric,
        }
    }

    // ── month grid ───────────────────────────────────────────────────────

    #[test]
    fn test_month_grid_feb_2024() {
        let index = LogIndex::default();
        let grid = build_month_grid(2024, 1, &index, &ctx("2025-01-01", None, Metric::Mood));

        assert_eq!(grid.cells().count(), 29);
        assert!(grid.weeks.iter().all(|w| w.len() == 7));
        // Feb 1 2024 is a Thursday
        let first_week = &grid.weeks[0];
        assert!(first_week[..4].iter().all(Option::is_none));
        assert_eq!(first_week[4].as_ref().unwrap().date, d("2024-02-01"));
        assert_eq!(grid.weeks.len(), 5);
        assert_eq!(grid.label, "February 2024");
    }

    #[test]
    fn test_month_grid_trailing_padding() {
        let index = LogIndex::default();
        // June 2025 starts on a Sunday and ends on a Monday
        let grid = build_month_grid(2025, 5, &index, &ctx("2025-12-31", None, Metric::Mood));
        assert!(grid.weeks[0][0].is_some());
        let last = grid.weeks.last().unwrap();
        assert_eq!(last[1].as_ref().unwrap().date, d("2025-06-30"));
        assert!(last[2..].iter().all(Option::is_none));
        assert_eq!(grid.cells().count(), 30);
    }

    #[test]
    fn test_month_grid_days_are_contiguous() {
        let index = LogIndex::default();
        let grid = build_month_grid(2023, 11, &index, &ctx("2025-01-01", None, Metric::Mood));
        let days: Vec<u32> = grid.cells().map(|c| c.date.day).collect();
        assert_eq!(days, (1..=31).collect::<Vec<_>>());
    }

    #[test]
    #[should_panic(expected = "month index out of range")]
    fn test_month_grid_rejects_bad_month() {
        let index = LogIndex::default();
        build_month_grid(2024, 12, &index, &ctx("2025-01-01", None, Metric::Mood));
    }

    #[test]
    fn test_selected_cell_maps_to_mood_bucket() {
        let logs = vec![log("2025-06-10", 5, true, 0)];
        let index = LogIndex::new(&logs);
        let grid = build_month_grid(2025, 5, &index, &ctx("2025-06-20", Some("2025-06-10"), Metric::Mood));

        let cell = grid.cells().find(|c| c.date == d("2025-06-10")).unwrap();
        assert!(cell.is_selected);
        assert_eq!(cell.bucket, 5);
        assert_eq!(cell.log, Some(&logs[0]));
        assert_eq!(cell.tooltip.as_deref(), Some("2025-06-10: Great"));
        assert_eq!(grid.cells().filter(|c| c.is_selected).count(), 1);
    }

    #[test]
    fn test_future_days_flagged_in_month_grid() {
        let logs = vec![log("2025-06-11", 3, false, 0)];
        let index = LogIndex::new(&logs);
        let grid = build_month_grid(2025, 5, &index, &ctx("2025-06-10", None, Metric::Mood));

        let today = grid.cells().find(|c| c.date == d("2025-06-10")).unwrap();
        assert!(!today.is_future);
        assert!(today.interactive);

        let tomorrow = grid.cells().find(|c| c.date == d("2025-06-11")).unwrap();
        assert!(tomorrow.is_future);
        assert!(!tomorrow.interactive);
        assert!(tomorrow.tooltip.is_none());
    }

    #[test]
    fn test_disabled_cell_never_fires_callback() {
        let index = LogIndex::default();
        let grid = build_month_grid(2025, 5, &index, &ctx("2025-06-10", None, Metric::Mood));

        let mut picked = Vec::new();
        for cell in grid.cells() {
            cell.select(|date| picked.push(date));
        }
        assert_eq!(picked.len(), 10);
        assert_eq!(picked.last(), Some(&d("2025-06-10")));
    }

    // ── year grid ────────────────────────────────────────────────────────

    #[test]
    fn test_year_grid_shape_and_validity() {
        let index = LogIndex::default();
        let grid = build_year_grid(2023, &index, &ctx("2024-01-01", None, Metric::Workout));

        assert_eq!(grid.columns.len(), 12);
        assert!(grid.columns.iter().all(|c| c.cells.len() == 31));

        let feb = &grid.columns[1];
        assert_eq!(feb.days, 28);
        assert!(feb.cells[27].is_valid);
        assert!(!feb.cells[28].is_valid);
        assert!(!feb.cells[29].is_valid);
        assert!(!feb.cells[29].interactive);
        assert!(!grid.columns[3].cells[30].is_valid); // Apr 31
        assert!(grid.columns[11].cells[30].is_valid); // Dec 31

        let valid: usize = grid
            .columns
            .iter()
            .map(|c| c.cells.iter().filter(|cell| cell.is_valid).count())
            .sum();
        assert_eq!(valid, 365);
    }

    #[test]
    fn test_year_grid_leap_february() {
        let index = LogIndex::default();
        let grid = build_year_grid(2024, &index, &ctx("2025-01-01", None, Metric::Mood));
        let feb = &grid.columns[1];
        assert!(feb.cells[28].is_valid);
        assert!(!feb.cells[29].is_valid);
    }

    #[test]
    fn test_future_days_flagged_in_year_grid() {
        let logs = vec![log("2025-03-16", 4, true, 2)];
        let index = LogIndex::new(&logs);
        let grid = build_year_grid(2025, &index, &ctx("2025-03-15", None, Metric::Alcohol));

        let tomorrow = &grid.columns[2].cells[15];
        assert_eq!(tomorrow.date, d("2025-03-16"));
        assert!(tomorrow.is_future);
        assert!(!tomorrow.interactive);
        assert_eq!(tomorrow.bucket, 2);

        assert!(!grid.columns[2].cells[14].is_future);
        assert!(grid.columns[11].cells[0].is_future);
    }

    // ── activity grid ────────────────────────────────────────────────────

    #[test]
    fn test_activity_grid_spans_year() {
        let index = LogIndex::default();
        let grid = build_activity_grid(2025, &index, &ctx("2026-01-01", None, Metric::Mood));

        // Jan 1 2025 is a Wednesday: 3 padding days from 2024
        let first = &grid.weeks[0];
        assert_eq!(first[0].date, d("2024-12-29"));
        assert!(!first[0].is_current_period);
        assert!(!first[0].interactive);
        assert_eq!(first[3].date, d("2025-01-01"));
        assert!(first[3].is_current_period);

        let in_year: usize = grid
            .weeks
            .iter()
            .map(|w| w.iter().filter(|c| c.is_current_period).count())
            .sum();
        assert_eq!(in_year, 365);
        assert!(grid.weeks.iter().all(|w| w[0].date.weekday() == 0));
        assert_eq!(grid.weeks.last().unwrap()[6].date, d("2026-01-03"));

        assert_eq!(grid.month_starts[0].week, 0);
        assert_eq!(grid.month_starts[1].week, 4); // Feb 1 2025 is a Saturday
    }

    // ── metric buckets ───────────────────────────────────────────────────

    #[test]
    fn test_buckets_are_total() {
        assert_eq!(Metric::Mood.bucket(None), 0);
        assert_eq!(Metric::Workout.bucket(None), 0);
        assert_eq!(Metric::Alcohol.bucket(None), 0);

        assert_eq!(Metric::Mood.bucket(Some(&log("2025-01-01", 3, false, 0))), 3);
        assert_eq!(Metric::Mood.bucket(Some(&log("2025-01-01", 9, false, 0))), 5);
        assert_eq!(Metric::Workout.bucket(Some(&log("2025-01-01", 3, true, 0))), 1);
        assert_eq!(Metric::Workout.bucket(Some(&log("2025-01-01", 3, false, 0))), 0);
        assert_eq!(Metric::Alcohol.bucket(Some(&log("2025-01-01", 3, false, 12))), 5);
        assert_eq!(Metric::Alcohol.bucket(Some(&log("2025-01-01", 3, false, -2))), 0);

        for metric in [Metric::Mood, Metric::Workout, Metric::Alcohol] {
            for drinks in -3..10 {
                for mood in -1..8 {
                    let b = metric.bucket(Some(&log("2025-01-01", mood, drinks % 2 == 0, drinks)));
                    assert!(b < metric.bucket_count());
                }
            }
        }
    }

    #[test]
    fn test_tooltips() {
        let one = log("2025-01-01", 2, false, 1);
        assert_eq!(Metric::Alcohol.tooltip(one.date, &one), "2025-01-01: 1 drink");
        assert_eq!(Metric::Workout.tooltip(one.date, &one), "2025-01-01: No");
        assert_eq!(Metric::Mood.tooltip(one.date, &one), "2025-01-01: Bad");
        assert_eq!(Metric::Alcohol.legend().last().unwrap().label, "5+");
    }

    // ── navigation ───────────────────────────────────────────────────────

    #[test]
    fn test_month_cursor_navigation() {
        let today = d("2025-01-15");
        let jan = MonthCursor::containing(today);
        assert_eq!(jan.next(today), None);
        let dec = jan.prev();
        assert_eq!(dec, MonthCursor::new(2024, 11));
        assert_eq!(dec.next(today), Some(jan));
        assert_eq!(dec.label(), "December 2024");
    }

    #[test]
    fn test_timeline_months_bounds() {
        let anchor = MonthCursor::new(2025, 5);

        let none = timeline_months(None, anchor);
        assert_eq!(none.len(), 12);
        assert_eq!(none[0], anchor);
        assert_eq!(none[11], MonthCursor::new(2024, 6));

        let recent = timeline_months(Some(d("2025-04-02")), anchor);
        assert_eq!(recent.len(), 12);

        let two_years = timeline_months(Some(d("2023-03-20")), anchor);
        assert_eq!(two_years.len(), 28);
        assert_eq!(two_years.last(), Some(&MonthCursor::new(2023, 2)));

        let ancient = timeline_months(Some(d("2010-01-01")), anchor);
        assert_eq!(ancient.len(), 60);

        let far_future = timeline_months(
            Some(LocalDate::new(i32::MAX, 0, 1)),
            MonthCursor::new(i32::MIN, 0),
        );
        assert_eq!(far_future.len(), 12);
    }

    #[test]
    fn test_build_timeline_uses_earliest_log() {
        let logs = vec![log("2023-06-01", 3, false, 0), log("2025-06-01", 4, true, 0)];
        let index = LogIndex::new(&logs);
        let grids = build_timeline(
            MonthCursor::new(2025, 5),
            &index,
            &ctx("2025-06-10", None, Metric::Mood),
        );
        assert_eq!(grids.len(), 25);
        assert_eq!(grids[0].label, "June 2025");
        assert_eq!(grids[24].label, "June 2023");
    }
}
