use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::metrics::RecorderStats;
use crate::optimizer::{CurrentLimits, HealthReport, Recommendation};
use crate::AppState;

use super::{AppError, Generated};

// ─── Response types ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Recommendations {
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointHealth {
    pub endpoints: HealthReport,
}

#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub janitor_running: bool,
    pub configured_limits: usize,
    #[serde(flatten)]
    pub recorder: RecorderStats,
}

// ─── GET /api/rate-limits/recommendations ────────────────────────

/// Analyze against the operator-managed limits table.
pub async fn recommendations(
    State(state): State<Arc<AppState>>,
) -> Json<Generated<Recommendations>> {
    // Clone so the analysis runs without holding the table lock
    let limits = state.limits.read().clone();
    let recommendations = state.optimizer.analyze(&limits);
    Json(Generated::now(Recommendations { recommendations }))
}

// ─── POST /api/rate-limits/analyze ───────────────────────────────

/// Analyze against caller-supplied limits. Malformed bodies fail loudly.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CurrentLimits>, JsonRejection>,
) -> Result<Json<Generated<Recommendations>>, AppError> {
    let Json(limits) = payload?;
    let recommendations = state.optimizer.analyze(&limits);
    Ok(Json(Generated::now(Recommendations { recommendations })))
}

// ─── GET /api/health/endpoints ───────────────────────────────────

pub async fn health_report(State(state): State<Arc<AppState>>) -> Json<Generated<EndpointHealth>> {
    Json(Generated::now(EndpointHealth {
        endpoints: state.optimizer.report(),
    }))
}

// ─── GET /api/status ─────────────────────────────────────────────

pub async fn status(State(state): State<Arc<AppState>>) -> Json<ServiceStatus> {
    Json(ServiceStatus {
        janitor_running: state.optimizer.is_running(),
        configured_limits: state.limits.read().len(),
        recorder: state.optimizer.stats(),
    })
}
