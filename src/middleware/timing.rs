use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use log::debug;
use std::sync::Arc;
use std::time::Instant;

use crate::AppState;

/// Long-lived SSE connections would skew latency; never recorded.
const STREAM_ROUTE: &str = "/api/metrics/stream";

/// Route-level middleware that feeds every completed request into the
/// optimizer and adds two response headers:
///
///   X-Response-Time-Us  — total handler wall time in microseconds
///   Server-Timing       — same value in the standard Server-Timing format
///
/// Installed with `route_layer`, so only matched routes reach it and the
/// endpoint key is the route template (`"GET /api/users/:id"`), which
/// keeps the number of tracked endpoints bounded.
pub async fn timing_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned());

    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed = start.elapsed();
    let us = elapsed.as_micros();

    // ── Inject response headers ─────────────────────────────────
    if let Ok(val) = us.to_string().parse() {
        response.headers_mut().insert("X-Response-Time-Us", val);
    }

    let server_timing =
        format!("total;dur={:.3}", elapsed.as_secs_f64() * 1000.0);
    if let Ok(val) = server_timing.parse() {
        response.headers_mut().insert("Server-Timing", val);
    }

    // ── Record ──────────────────────────────────────────────────
    let status = response.status();
    if let Some(route) = route.filter(|r| r != STREAM_ROUTE) {
        let endpoint = format!("{method} {route}");
        state.optimizer.record(
            &endpoint,
            elapsed.as_secs_f64() * 1000.0,
            status.is_server_error(),
        );
        debug!("{:>3}  {endpoint:<45} {us:>7}μs", status.as_u16());
    }

    response
}
