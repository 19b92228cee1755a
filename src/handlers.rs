use crate::calendar::{build_month_grid, default_month, MonthGrid};
use crate::daykey::{normalize, DayKey};
use crate::errors::{AppError, CoreError};
use crate::models::{
    AppData, CalendarQuery, Certification, CertifyRequest, Challenge, ChallengeView,
    CreateChallengeRequest, UpdateChallengeRequest,
};
use crate::progress::check_range;
use crate::state::AppState;
use crate::stats::{build_stats_at, ChallengeSnapshot, StatsReport};
use crate::storage::commit;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};

pub async fn index() -> Json<Value> {
    Json(json!({ "message": "Challenge Tracker API", "status": "OK" }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "OK", "timestamp": Utc::now().to_rfc3339() }))
}

pub async fn list_challenges(
    State(state): State<AppState>,
) -> Result<Json<Vec<ChallengeView>>, AppError> {
    let today = state.today();
    let mut data = state.data.lock().await;
    let mut next = data.clone();

    let mut views = Vec::with_capacity(next.challenges.len());
    let mut flipped = false;
    for challenge in next.challenges.values_mut() {
        let (view, changed) = refresh_status(challenge, today)?;
        flipped |= changed;
        views.push(view);
    }
    if flipped {
        commit(&state.data_path, &mut data, next).await?;
    }

    views.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(views))
}

pub async fn create_challenge(
    State(state): State<AppState>,
    Json(payload): Json<CreateChallengeRequest>,
) -> Result<(StatusCode, Json<ChallengeView>), AppError> {
    let name = required_text("name", &payload.name)?;
    let category = required_text("category", &payload.category)?;
    let (start_date, end_date) = validated_range(&payload.start_date, &payload.end_date)?;

    let now = Utc::now();
    let challenge = Challenge {
        id: uuid::Uuid::new_v4().to_string(),
        name,
        category,
        description: payload.description.unwrap_or_default().trim().to_string(),
        start_date,
        end_date,
        status: Default::default(),
        tasks: clean_tasks(payload.tasks.unwrap_or_default()),
        certifications: Default::default(),
        created_at: now,
        updated_at: now,
    };
    let view = ChallengeView::derive(&challenge, state.today())?;
    let (id, name) = (challenge.id.clone(), challenge.name.clone());

    let mut data = state.data.lock().await;
    let mut next = data.clone();
    next.insert_challenge(challenge);
    commit(&state.data_path, &mut data, next).await?;

    info!(id = %id, name = %name, "challenge created");
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_challenge(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChallengeView>, AppError> {
    let today = state.today();
    let mut data = state.data.lock().await;
    let mut next = data.clone();

    let (view, flipped) = refresh_status(next.challenge_mut(&id)?, today)?;
    if flipped {
        commit(&state.data_path, &mut data, next).await?;
    }

    Ok(Json(view))
}

pub async fn update_challenge(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateChallengeRequest>,
) -> Result<Json<ChallengeView>, AppError> {
    let today = state.today();
    let mut data = state.data.lock().await;
    let current = data.challenge(&id)?;

    let start_raw = payload
        .start_date
        .clone()
        .unwrap_or_else(|| current.start_date.to_string());
    let end_raw = payload
        .end_date
        .clone()
        .unwrap_or_else(|| current.end_date.to_string());
    let (start_date, end_date) = validated_range(&start_raw, &end_raw)?;
    let name = payload
        .name
        .as_deref()
        .map(|value| required_text("name", value))
        .transpose()?;
    let category = payload
        .category
        .as_deref()
        .map(|value| required_text("category", value))
        .transpose()?;

    let mut next = data.clone();
    let challenge = next.challenge_mut(&id)?;
    if let Some(name) = name {
        challenge.name = name;
    }
    if let Some(category) = category {
        challenge.category = category;
    }
    if let Some(description) = payload.description {
        challenge.description = description.trim().to_string();
    }
    if let Some(tasks) = payload.tasks {
        challenge.tasks = clean_tasks(tasks);
    }
    if let Some(status) = payload.status {
        challenge.status = status;
    }
    challenge.start_date = start_date;
    challenge.end_date = end_date;
    challenge.updated_at = Utc::now();

    let (view, _) = refresh_status(challenge, today)?;
    commit(&state.data_path, &mut data, next).await?;

    info!(id = %id, "challenge updated");
    Ok(Json(view))
}

pub async fn delete_challenge(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let mut data = state.data.lock().await;
    let mut next = data.clone();
    let removed = next.remove_challenge(&id)?;
    commit(&state.data_path, &mut data, next).await?;

    info!(
        id = %id,
        certifications = removed.certifications.len(),
        "challenge deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

pub async fn certify(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<CertifyRequest>,
) -> Result<(StatusCode, Json<Certification>), AppError> {
    let date = requested_date(payload)?;
    let mut data = state.data.lock().await;

    let mut next = data.clone();
    let certification = next.certify(&id, date)?;
    commit(&state.data_path, &mut data, next).await?;

    info!(id = %id, date = %date, "certification created");
    Ok((StatusCode::CREATED, Json(certification)))
}

pub async fn uncertify(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<CertifyRequest>,
) -> Result<Json<Certification>, AppError> {
    let date = requested_date(payload)?;
    let mut data = state.data.lock().await;

    let mut next = data.clone();
    let certification = next.uncertify(&id, date)?;
    commit(&state.data_path, &mut data, next).await?;

    info!(id = %id, date = %date, "certification removed");
    Ok(Json(certification))
}

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsReport>, AppError> {
    let today = state.today();
    let mut data = state.data.lock().await;
    let mut next = data.clone();

    let mut flipped = false;
    for challenge in next.challenges.values_mut() {
        flipped |= refresh_status(challenge, today)?.1;
    }
    let snapshots = snapshots(&next);
    if flipped {
        commit(&state.data_path, &mut data, next).await?;
    }

    Ok(Json(build_stats_at(today, &snapshots)?))
}

pub async fn get_calendar(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<MonthGrid>, AppError> {
    let today = state.today();
    let data = state.data.lock().await;
    let challenge = data.challenge(&id)?;

    let (default_year, default_month) =
        default_month(challenge.start_date, challenge.end_date, today);
    let year = query.year.unwrap_or(default_year);
    let month = query.month.unwrap_or(default_month);
    debug!(id = %id, year, month, "building calendar");

    let grid = build_month_grid(
        year,
        month,
        challenge.start_date,
        challenge.end_date,
        &challenge.certifications,
        today,
    )?;
    Ok(Json(grid))
}

/// Recomputes the derived status and stores it when it flipped.
fn refresh_status(
    challenge: &mut Challenge,
    today: DayKey,
) -> Result<(ChallengeView, bool), CoreError> {
    let view = ChallengeView::derive(challenge, today)?;
    if view.status == challenge.status {
        return Ok((view, false));
    }

    info!(
        id = %challenge.id,
        name = %challenge.name,
        status = view.status.as_str(),
        "challenge status updated"
    );
    challenge.status = view.status;
    Ok((view, true))
}

fn snapshots(data: &AppData) -> Vec<ChallengeSnapshot> {
    data.challenges.values().map(Challenge::snapshot).collect()
}

fn validated_range(start: &str, end: &str) -> Result<(DayKey, DayKey), CoreError> {
    let start_date = normalize(start.trim())?;
    let end_date = normalize(end.trim())?;
    check_range(start_date, end_date)?;
    Ok((start_date, end_date))
}

fn requested_date(payload: CertifyRequest) -> Result<DayKey, AppError> {
    match payload.date.as_deref().map(str::trim) {
        Some(date) if !date.is_empty() => Ok(normalize(date)?),
        _ => Err(AppError::bad_request("Date is required")),
    }
}

fn required_text(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn clean_tasks(tasks: Vec<String>) -> Vec<String> {
    tasks
        .into_iter()
        .map(|task| task.trim().to_string())
        .filter(|task| !task.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::progress::ChallengeStatus;

    fn state_with_challenge(data_path: std::path::PathBuf) -> AppState {
        let now = Utc::now();
        let mut data = AppData::default();
        data.insert_challenge(Challenge {
            id: "c1".into(),
            name: "Push-ups".into(),
            category: "health".into(),
            description: String::new(),
            start_date: normalize("2099-01-01").unwrap(),
            end_date: normalize("2099-01-10").unwrap(),
            status: ChallengeStatus::Active,
            tasks: Vec::new(),
            certifications: Default::default(),
            created_at: now,
            updated_at: now,
        });
        let config = Config {
            port: 0,
            data_path,
            utc_offset_hours: 9,
        };
        AppState::new(&config, data)
    }

    fn certify_body(date: &str) -> Json<CertifyRequest> {
        Json(CertifyRequest {
            date: Some(date.to_string()),
        })
    }

    #[tokio::test]
    async fn failed_write_leaves_memory_unchanged() {
        // a directory cannot be written as a file
        let state = state_with_challenge(std::env::temp_dir());

        let err = certify(State(state.clone()), Path("c1".into()), certify_body("2099-01-02"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(state
            .data
            .lock()
            .await
            .challenge("c1")
            .unwrap()
            .certifications
            .is_empty());

        let err = delete_challenge(State(state.clone()), Path("c1".into()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(state.data.lock().await.challenge("c1").is_ok());

        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let writable_path = std::env::temp_dir().join(format!(
            "challenge_tracker_handlers_{}_{nanos}.json",
            std::process::id()
        ));
        let writable = AppState {
            data_path: writable_path.clone(),
            ..state.clone()
        };
        let (status, Json(certification)) =
            certify(State(writable), Path("c1".into()), certify_body("2099-01-02"))
                .await
                .unwrap();
        let _ = std::fs::remove_file(&writable_path);

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(certification.date.to_string(), "2099-01-02");
        assert_eq!(
            state.data.lock().await.challenge("c1").unwrap().certifications.len(),
            1
        );
    }

    #[test]
    fn range_validation_reports_each_error_kind() {
        assert!(validated_range("2024-01-01", "2024-01-31").is_ok());
        assert!(matches!(
            validated_range("2024-1-01", "2024-01-31"),
            Err(CoreError::InvalidFormat(_))
        ));
        assert!(matches!(
            validated_range("2024-01-01", "2024-02-30"),
            Err(CoreError::InvalidDate(_))
        ));
        assert!(matches!(
            validated_range("2024-02-01", "2024-01-31"),
            Err(CoreError::InvalidRange { .. })
        ));
    }

    #[test]
    fn missing_date_is_bad_request() {
        let err = requested_date(CertifyRequest { date: None }).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let err = requested_date(CertifyRequest {
            date: Some("  ".into()),
        })
        .unwrap_err();
        assert_eq!(err.message, "Date is required");
    }

    #[test]
    fn tasks_are_trimmed_and_blank_ones_dropped() {
        let tasks = clean_tasks(vec![" warm up ".into(), "".into(), "run".into()]);
        assert_eq!(tasks, vec!["warm up".to_string(), "run".to_string()]);
    }
}
