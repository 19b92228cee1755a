//! Month view of a challenge: six Sunday-first weeks of annotated days.

use crate::daykey::DayKey;
use crate::errors::CoreError;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeSet;

pub const GRID_WEEKS: usize = 6;
pub const DAYS_PER_WEEK: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCell {
    pub date: u32,
    pub day_key: DayKey,
    pub is_current_month: bool,
    pub is_today: bool,
    pub is_certified: bool,
    pub is_in_range: bool,
    pub is_missed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<Vec<DayCell>>,
}

impl MonthGrid {
    pub fn cells(&self) -> impl Iterator<Item = &DayCell> {
        self.weeks.iter().flatten()
    }
}

/// Builds the 42-cell grid for `year`/`month`.
///
/// The first cell is the Sunday on or before the 1st. Days from the
/// neighbouring months are included with `is_current_month == false`.
pub fn build_month_grid(
    year: i32,
    month: u32,
    start: DayKey,
    end: DayKey,
    certified: &BTreeSet<DayKey>,
    today: DayKey,
) -> Result<MonthGrid, CoreError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| CoreError::InvalidDate(format!("{year:04}-{month:02}")))?;
    let lead = i64::from(first.weekday().num_days_from_sunday());
    let grid_start = DayKey::from_date(first)
        .offset_days(-lead)
        .ok_or_else(|| CoreError::InvalidDate(format!("{year:04}-{month:02}")))?;

    let mut weeks = Vec::with_capacity(GRID_WEEKS);
    let mut week = Vec::with_capacity(DAYS_PER_WEEK);
    let mut cursor = Some(grid_start);

    for _ in 0..GRID_WEEKS * DAYS_PER_WEEK {
        let day_key = cursor
            .ok_or_else(|| CoreError::InvalidDate(format!("{year:04}-{month:02}")))?;
        let is_certified = certified.contains(&day_key);
        let is_in_range = start <= day_key && day_key <= end;

        week.push(DayCell {
            date: day_key.day(),
            day_key,
            is_current_month: day_key.year() == year && day_key.month() == month,
            is_today: day_key == today,
            is_certified,
            is_in_range,
            is_missed: day_key < today && is_in_range && !is_certified,
        });

        if week.len() == DAYS_PER_WEEK {
            weeks.push(std::mem::replace(&mut week, Vec::with_capacity(DAYS_PER_WEEK)));
        }
        cursor = day_key.succ();
    }

    Ok(MonthGrid { year, month, weeks })
}

/// Moves `delta` months forward (or back when negative).
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    shift_month(year, month, 1)
}

pub fn prev_month(year: i32, month: u32) -> (i32, u32) {
    shift_month(year, month, -1)
}

/// Month to open first: today's month while the challenge is running,
/// otherwise the month it starts in.
pub fn default_month(start: DayKey, end: DayKey, today: DayKey) -> (i32, u32) {
    if start <= today && today <= end {
        (today.year(), today.month())
    } else {
        (start.year(), start.month())
    }
}
