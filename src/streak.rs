//! Consecutive-day streaks over a set of certified days.

use crate::daykey::DayKey;
use serde::Serialize;
use std::collections::BTreeSet;

/// Lookback used by the statistics report for the longest run.
pub const STREAK_WINDOW_DAYS: u32 = 365;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakStats {
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Current and longest runs over the whole history.
///
/// `days` is the union of certified days across challenges; a day counts
/// once no matter how many challenges were certified on it.
pub fn compute_streaks(days: &BTreeSet<DayKey>, today: DayKey) -> StreakStats {
    StreakStats {
        current_streak: current_streak(days, today),
        longest_streak: longest_streak(days),
    }
}

/// Run of present days ending at `today`, walking backward until a gap.
pub fn current_streak(days: &BTreeSet<DayKey>, today: DayKey) -> u32 {
    let mut streak = 0;
    let mut cursor = Some(today);
    while let Some(day) = cursor {
        if !days.contains(&day) {
            break;
        }
        streak += 1;
        cursor = day.pred();
    }
    streak
}

/// Longest run of consecutive days anywhere in `days`.
pub fn longest_streak(days: &BTreeSet<DayKey>) -> u32 {
    longest_run(days.iter())
}

/// Longest run among the `window_days` days ending at and including `today`.
pub fn longest_streak_within(days: &BTreeSet<DayKey>, today: DayKey, window_days: u32) -> u32 {
    if window_days == 0 {
        return 0;
    }
    match today.offset_days(-(i64::from(window_days) - 1)) {
        Some(oldest) => longest_run(days.range(oldest..=today)),
        None => longest_run(days.range(..=today)),
    }
}

// Expects keys in ascending order.
fn longest_run<'a>(days: impl Iterator<Item = &'a DayKey>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut prev: Option<DayKey> = None;

    for day in days {
        run = match prev {
            Some(p) if p.succ() == Some(*day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(*day);
    }

    longest
}
