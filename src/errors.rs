use axum::{http::StatusCode, Json};
use serde_json::json;

use crate::daykey::DayKey;

/// Failures raised by the date and progress engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid date format: {0}. Expected YYYY-MM-DD")]
    InvalidFormat(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid range: start date {start} is after end date {end}")]
    InvalidRange { start: DayKey, end: DayKey },
}

/// Failures raised by the challenge store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Challenge not found: {0}")]
    ChallengeNotFound(String),

    #[error("Certification already exists for this date: {date}")]
    DuplicateCertification { challenge_id: String, date: DayKey },

    #[error("Certification not found for this date: {date}")]
    CertificationNotFound { challenge_id: String, date: DayKey },
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateCertification { .. } => Self::bad_request(err.to_string()),
            StoreError::ChallengeNotFound(_) | StoreError::CertificationNotFound { .. } => {
                Self::not_found(err.to_string())
            }
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
