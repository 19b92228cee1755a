use crate::daykey::DayKey;
use crate::errors::{AppError, StoreError};
use crate::models::{AppData, Certification, Challenge};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, warn};

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                set_aside(path).await;
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            AppData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}

// Keeps an unreadable store out of the way of the next write.
async fn set_aside(path: &Path) {
    let mut backup = path.as_os_str().to_owned();
    backup.push(format!(".corrupt-{}", Utc::now().format("%Y%m%dT%H%M%S%.3f")));
    let backup = PathBuf::from(backup);

    match fs::rename(path, &backup).await {
        Ok(()) => warn!("moved unreadable data file to {}", backup.display()),
        Err(err) => error!("failed to move unreadable data file aside: {err}"),
    }
}

/// Writes `next` to disk and only then makes it the live store.
///
/// On a failed write `live` is left untouched.
pub async fn commit(path: &Path, live: &mut AppData, next: AppData) -> Result<(), AppError> {
    persist_data(path, &next).await?;
    *live = next;
    Ok(())
}

impl AppData {
    pub fn challenge(&self, id: &str) -> Result<&Challenge, StoreError> {
        self.challenges
            .get(id)
            .ok_or_else(|| StoreError::ChallengeNotFound(id.to_string()))
    }

    pub fn challenge_mut(&mut self, id: &str) -> Result<&mut Challenge, StoreError> {
        self.challenges
            .get_mut(id)
            .ok_or_else(|| StoreError::ChallengeNotFound(id.to_string()))
    }

    pub fn insert_challenge(&mut self, challenge: Challenge) {
        self.challenges.insert(challenge.id.clone(), challenge);
    }

    /// Removes a challenge together with its certifications.
    pub fn remove_challenge(&mut self, id: &str) -> Result<Challenge, StoreError> {
        self.challenges
            .remove(id)
            .ok_or_else(|| StoreError::ChallengeNotFound(id.to_string()))
    }

    /// Records a certification; an existing one for the same day is an error.
    pub fn certify(&mut self, id: &str, date: DayKey) -> Result<Certification, StoreError> {
        let challenge = self.challenge_mut(id)?;
        if !challenge.certifications.insert(date) {
            return Err(StoreError::DuplicateCertification {
                challenge_id: id.to_string(),
                date,
            });
        }
        Ok(Certification {
            challenge_id: id.to_string(),
            date,
        })
    }

    pub fn uncertify(&mut self, id: &str, date: DayKey) -> Result<Certification, StoreError> {
        let challenge = self.challenge_mut(id)?;
        if !challenge.certifications.remove(&date) {
            return Err(StoreError::CertificationNotFound {
                challenge_id: id.to_string(),
                date,
            });
        }
        Ok(Certification {
            challenge_id: id.to_string(),
            date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daykey::normalize;
    use crate::progress::ChallengeStatus;
    use std::collections::BTreeSet;

    fn challenge(id: &str) -> Challenge {
        let now = Utc::now();
        Challenge {
            id: id.into(),
            name: "Read".into(),
            category: "reading".into(),
            description: String::new(),
            start_date: normalize("2024-01-01").unwrap(),
            end_date: normalize("2024-01-10").unwrap(),
            status: ChallengeStatus::Active,
            tasks: Vec::new(),
            certifications: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("challenge_tracker_{name}_{}_{nanos}.json", std::process::id()))
    }

    #[test]
    fn duplicate_certification_is_rejected_without_change() {
        let mut data = AppData::default();
        data.insert_challenge(challenge("a"));
        let day = normalize("2024-01-03").unwrap();

        assert!(data.certify("a", day).is_ok());
        assert_eq!(
            data.certify("a", day),
            Err(StoreError::DuplicateCertification {
                challenge_id: "a".into(),
                date: day
            })
        );
        assert_eq!(data.challenge("a").unwrap().certifications.len(), 1);
    }

    #[test]
    fn uncertify_requires_existing_record() {
        let mut data = AppData::default();
        data.insert_challenge(challenge("a"));
        let day = normalize("2024-01-03").unwrap();

        assert!(matches!(
            data.uncertify("a", day),
            Err(StoreError::CertificationNotFound { .. })
        ));
        data.certify("a", day).unwrap();
        assert_eq!(data.uncertify("a", day).unwrap().date, day);
        assert!(data.challenge("a").unwrap().certifications.is_empty());
    }

    #[test]
    fn unknown_challenge_is_not_found() {
        let mut data = AppData::default();
        let day = normalize("2024-01-03").unwrap();
        assert_eq!(
            data.certify("missing", day),
            Err(StoreError::ChallengeNotFound("missing".into()))
        );
        assert!(data.remove_challenge("missing").is_err());
    }

    #[test]
    fn remove_drops_certifications_with_challenge() {
        let mut data = AppData::default();
        data.insert_challenge(challenge("a"));
        data.certify("a", normalize("2024-01-02").unwrap()).unwrap();
        let removed = data.remove_challenge("a").unwrap();
        assert_eq!(removed.certifications.len(), 1);
        assert!(data.challenges.is_empty());
    }

    #[tokio::test]
    async fn persist_then_load_keeps_certifications() {
        let path = temp_path("roundtrip");
        let mut data = AppData::default();
        data.insert_challenge(challenge("a"));
        data.certify("a", normalize("2024-01-05").unwrap()).unwrap();

        persist_data(&path, &data).await.unwrap();
        let loaded = load_data(&path).await;
        let _ = std::fs::remove_file(&path);

        let stored = loaded.challenge("a").unwrap();
        assert!(stored.certifications.contains(&normalize("2024-01-05").unwrap()));
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let path = temp_path("missing");
        assert!(load_data(&path).await.challenges.is_empty());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_moved_aside_before_next_write() {
        let path = temp_path("corrupt");
        std::fs::write(&path, b"{ not json").unwrap();

        let mut loaded = load_data(&path).await;
        assert!(loaded.challenges.is_empty());
        assert!(!path.exists());

        let file_name = path.file_name().unwrap().to_string_lossy().to_string();
        let backups: Vec<PathBuf> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().starts_with(&format!("{file_name}.corrupt-")))
                    .unwrap_or(false)
            })
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(std::fs::read(&backups[0]).unwrap(), b"{ not json");

        let next = {
            let mut next = loaded.clone();
            next.insert_challenge(challenge("a"));
            next
        };
        commit(&path, &mut loaded, next).await.unwrap();
        assert_eq!(std::fs::read(&backups[0]).unwrap(), b"{ not json");

        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_file(&backups[0]);
    }

    #[tokio::test]
    async fn failed_commit_keeps_live_store() {
        let mut live = AppData::default();
        live.insert_challenge(challenge("a"));
        let mut next = live.clone();
        next.certify("a", normalize("2024-01-04").unwrap()).unwrap();

        // writing to a directory always fails
        let dir = std::env::temp_dir();
        assert!(commit(&dir, &mut live, next).await.is_err());
        assert!(live.challenge("a").unwrap().certifications.is_empty());
    }
}
