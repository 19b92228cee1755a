use crate::daykey::{today_key, DayKey};
use crate::errors::CoreError;
use crate::progress::{compute_progress, ChallengeStatus};
use crate::streak::{current_streak, longest_streak_within, StreakStats, STREAK_WINDOW_DAYS};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

const RECENT_DAYS: i64 = 7;

/// The parts of a challenge the statistics report reads.
#[derive(Debug, Clone)]
pub struct ChallengeSnapshot {
    pub status: ChallengeStatus,
    pub category: String,
    pub start_date: DayKey,
    pub end_date: DayKey,
    pub certified_days: BTreeSet<DayKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCertifications {
    pub date: DayKey,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub average_progress: u8,
    pub total_certifications: usize,
    pub category_stats: BTreeMap<String, usize>,
    pub recent_certifications: Vec<DailyCertifications>,
    pub streak_stats: StreakStats,
}

pub fn build_stats(
    challenges: &[ChallengeSnapshot],
    offset_hours: i32,
) -> Result<StatsReport, CoreError> {
    build_stats_at(today_key(offset_hours), challenges)
}

pub fn build_stats_at(
    today: DayKey,
    challenges: &[ChallengeSnapshot],
) -> Result<StatsReport, CoreError> {
    let active = challenges
        .iter()
        .filter(|c| c.status == ChallengeStatus::Active)
        .count();
    let completed = challenges
        .iter()
        .filter(|c| c.status == ChallengeStatus::Completed)
        .count();

    let mut progress_sum = 0u64;
    for challenge in challenges {
        let progress = compute_progress(
            challenge.start_date,
            challenge.end_date,
            challenge.certified_days.len(),
        )?;
        progress_sum += u64::from(progress.progress);
    }
    let average_progress = if challenges.is_empty() {
        0
    } else {
        let n = challenges.len() as u64;
        ((2 * progress_sum + n) / (2 * n)) as u8
    };

    let mut category_stats = BTreeMap::new();
    for challenge in challenges {
        *category_stats.entry(challenge.category.clone()).or_insert(0) += 1;
    }

    let mut recent_certifications = Vec::with_capacity(RECENT_DAYS as usize);
    for offset in (0..RECENT_DAYS).rev() {
        let Some(date) = today.offset_days(-offset) else {
            continue;
        };
        let count = challenges
            .iter()
            .filter(|c| c.certified_days.contains(&date))
            .count();
        recent_certifications.push(DailyCertifications { date, count });
    }

    let total_certifications = challenges.iter().map(|c| c.certified_days.len()).sum();

    let all_days: BTreeSet<DayKey> = challenges
        .iter()
        .flat_map(|c| c.certified_days.iter().copied())
        .collect();
    let streak_stats = StreakStats {
        current_streak: current_streak(&all_days, today),
        longest_streak: longest_streak_within(&all_days, today, STREAK_WINDOW_DAYS),
    };

    Ok(StatsReport {
        total: challenges.len(),
        active,
        completed,
        average_progress,
        total_certifications,
        category_stats,
        recent_certifications,
        streak_stats,
    })
}
