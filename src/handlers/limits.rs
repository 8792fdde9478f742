use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use log::info;

use crate::optimizer::LimitConfig;
use crate::AppState;

use super::AppError;

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct SetLimitRequest {
    pub endpoint: String,
    pub max_requests: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoveLimitRequest {
    pub endpoint: String,
}

#[derive(Debug, Serialize)]
pub struct LimitsResponse {
    pub limits: BTreeMap<String, LimitConfig>,
}

fn snapshot(state: &AppState) -> LimitsResponse {
    let limits = state.limits.read();
    LimitsResponse {
        limits: limits.iter().map(|(k, v)| (k.clone(), *v)).collect(),
    }
}

// ─── GET /api/rate-limits ────────────────────────────────────────

pub async fn list_limits(State(state): State<Arc<AppState>>) -> Json<LimitsResponse> {
    Json(snapshot(&state))
}

// ─── PUT /api/rate-limits ────────────────────────────────────────

/// Operator applies a limit (typically after reviewing a recommendation).
pub async fn set_limit(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SetLimitRequest>, JsonRejection>,
) -> Result<Json<LimitsResponse>, AppError> {
    let Json(req) = payload?;

    let endpoint = req.endpoint.trim();
    if endpoint.is_empty() {
        return Err(AppError::BadRequest("endpoint must not be empty".into()));
    }
    if req.max_requests == 0 {
        return Err(AppError::BadRequest(
            "max_requests must be greater than zero".into(),
        ));
    }

    let previous = state.limits.write().insert(
        endpoint.to_owned(),
        LimitConfig {
            max_requests: req.max_requests,
        },
    );
    info!(
        "limit for {endpoint} set to {} (was {})",
        req.max_requests,
        previous.map_or_else(|| "unset".to_string(), |p| p.max_requests.to_string())
    );

    Ok(Json(snapshot(&state)))
}

// ─── DELETE /api/rate-limits ─────────────────────────────────────

/// Drop an entry; the endpoint falls back to the default limit.
pub async fn remove_limit(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RemoveLimitRequest>, JsonRejection>,
) -> Result<Json<LimitsResponse>, AppError> {
    let Json(req) = payload?;

    if state.limits.write().remove(req.endpoint.trim()).is_none() {
        return Err(AppError::NotFound(format!(
            "no limit configured for '{}'",
            req.endpoint
        )));
    }
    info!("limit for {} removed", req.endpoint.trim());

    Ok(Json(snapshot(&state)))
}
