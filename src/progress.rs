use crate::daykey::{day_difference, DayKey};
use crate::errors::CoreError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    #[default]
    Active,
    Completed,
}

impl ChallengeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub total_days: u32,
    pub progress: u8,
}

/// Completion percentage over the inclusive `[start, end]` range.
///
/// `certified_count` is the raw number of certifications on the challenge,
/// including any that fall outside the range, so the percentage is clamped
/// at 100.
pub fn compute_progress(
    start: DayKey,
    end: DayKey,
    certified_count: usize,
) -> Result<Progress, CoreError> {
    check_range(start, end)?;

    let total_days = (day_difference(end, start) + 1) as u64;
    let count = certified_count as u64;
    // round(100 * count / total) with halves rounding up
    let rounded = (200 * count + total_days) / (2 * total_days);

    Ok(Progress {
        total_days: total_days as u32,
        progress: rounded.min(100) as u8,
    })
}

/// Rejects a range whose start falls after its end.
pub fn check_range(start: DayKey, end: DayKey) -> Result<(), CoreError> {
    if start > end {
        return Err(CoreError::InvalidRange { start, end });
    }
    Ok(())
}

/// Status after applying the completion rules. `Completed` is sticky.
pub fn compute_status(
    current: ChallengeStatus,
    end: DayKey,
    today: DayKey,
    progress: u8,
) -> ChallengeStatus {
    if current == ChallengeStatus::Completed || progress >= 100 || end < today {
        ChallengeStatus::Completed
    } else {
        ChallengeStatus::Active
    }
}
