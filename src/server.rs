use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::metrics::stream;
use crate::middleware::timing;
use crate::AppState;

/// Builds the full Axum `Router` with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // ── Sample ingestion from external HTTP layers ──────────
        .route("/api/metrics/samples", post(handlers::ingest::record_samples))
        // ── Metrics ─────────────────────────────────────────────
        .route("/api/metrics", get(stream::get_metrics))
        .route("/api/metrics/stream", get(stream::metrics_stream))
        .route("/api/health/endpoints", get(handlers::optimizer::health_report))
        // ── Limits and recommendations ──────────────────────────
        .route(
            "/api/rate-limits",
            get(handlers::limits::list_limits)
                .put(handlers::limits::set_limit)
                .delete(handlers::limits::remove_limit),
        )
        .route(
            "/api/rate-limits/recommendations",
            get(handlers::optimizer::recommendations),
        )
        .route(
            "/api/rate-limits/analyze",
            post(handlers::optimizer::analyze),
        )
        .route("/api/status", get(handlers::optimizer::status))
        // ── Record every matched route (runs after routing) ─────
        .route_layer(axum_mw::from_fn_with_state(
            state.clone(),
            timing::timing_middleware,
        ))
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        // ── Global middleware ───────────────────────────────────
        .layer(CorsLayer::permissive())
}
