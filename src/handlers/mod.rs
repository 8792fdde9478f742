pub mod ingest;
pub mod limits;
pub mod optimizer;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

// ─── Shared response envelope ────────────────────────────────────

/// Report-style responses carry the time they were computed, since the
/// underlying windows keep moving.
#[derive(Debug, Clone, Serialize)]
pub struct Generated<T: Serialize> {
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> Generated<T> {
    pub fn now(data: T) -> Self {
        Self {
            generated_at: Utc::now(),
            data,
        }
    }
}

// ─── Unified error type ──────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = serde_json::json!({
            "error":  self.to_string(),
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
