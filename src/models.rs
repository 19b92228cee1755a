use crate::daykey::DayKey;
use crate::errors::CoreError;
use crate::progress::{compute_progress, compute_status, ChallengeStatus};
use crate::stats::ChallengeSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A stored challenge with its certified days embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub start_date: DayKey,
    pub end_date: DayKey,
    #[serde(default)]
    pub status: ChallengeStatus,
    #[serde(default)]
    pub tasks: Vec<String>,
    #[serde(default, with = "certification_map")]
    pub certifications: BTreeSet<DayKey>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Challenge {
    pub fn snapshot(&self) -> ChallengeSnapshot {
        ChallengeSnapshot {
            status: self.status,
            category: self.category.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            certified_days: self.certifications.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    pub challenges: BTreeMap<String, Challenge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    pub challenge_id: String,
    pub date: DayKey,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChallengeRequest {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub tasks: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChallengeRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub tasks: Option<Vec<String>>,
    pub status: Option<ChallengeStatus>,
}

#[derive(Debug, Deserialize)]
pub struct CertifyRequest {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// A challenge as returned to clients, with derived progress and status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeView {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub start_date: DayKey,
    pub end_date: DayKey,
    pub status: ChallengeStatus,
    pub tasks: Vec<String>,
    #[serde(with = "certification_map")]
    pub certifications: BTreeSet<DayKey>,
    pub progress: u8,
    pub total_days: u32,
    pub certified_days: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChallengeView {
    pub fn derive(challenge: &Challenge, today: DayKey) -> Result<Self, CoreError> {
        let progress = compute_progress(
            challenge.start_date,
            challenge.end_date,
            challenge.certifications.len(),
        )?;
        let status = compute_status(
            challenge.status,
            challenge.end_date,
            today,
            progress.progress,
        );

        Ok(Self {
            id: challenge.id.clone(),
            name: challenge.name.clone(),
            category: challenge.category.clone(),
            description: challenge.description.clone(),
            start_date: challenge.start_date,
            end_date: challenge.end_date,
            status,
            tasks: challenge.tasks.clone(),
            certifications: challenge.certifications.clone(),
            progress: progress.progress,
            total_days: progress.total_days,
            certified_days: challenge.certifications.len(),
            created_at: challenge.created_at,
            updated_at: challenge.updated_at,
        })
    }
}

/// Certified days on the wire: `{ "YYYY-MM-DD": true, ... }`.
mod certification_map {
    use crate::daykey::DayKey;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::{BTreeMap, BTreeSet};

    pub fn serialize<S: Serializer>(days: &BTreeSet<DayKey>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(days.iter().map(|day| (day, true)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeSet<DayKey>, D::Error> {
        let map = BTreeMap::<DayKey, bool>::deserialize(deserializer)?;
        Ok(map
            .into_iter()
            .filter_map(|(day, present)| present.then_some(day))
            .collect())
    }
}
