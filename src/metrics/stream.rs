use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use super::percentiles::PercentileSet;
use super::{aggregate, RecorderStats};
use crate::handlers::optimizer::EndpointHealth;
use crate::handlers::Generated;
use crate::AppState;

/// How often the SSE stream pushes a fresh health report.
const STREAM_INTERVAL: Duration = Duration::from_secs(2);

/// Window-level detail for one endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointMetrics {
    pub samples_in_window: usize,
    pub requests_per_minute: f64,
    pub error_rate: f64,
    pub latency: PercentileSet,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    #[serde(flatten)]
    pub totals: RecorderStats,
    pub endpoints: BTreeMap<String, EndpointMetrics>,
}

/// Percentiles and rates over each endpoint's full current window.
pub fn snapshot(state: &AppState) -> MetricsSnapshot {
    let recorder = state.optimizer.recorder();
    let windows = recorder.snapshot();
    let now = recorder.now();
    let window = recorder.config().window_duration;

    let endpoints = windows
        .into_iter()
        .filter_map(|(endpoint, samples)| {
            let stats = aggregate(&samples, now, window, None);
            if stats.is_empty() {
                return None;
            }
            let latency = PercentileSet::from_samples(
                samples
                    .iter()
                    .filter(|s| now.saturating_duration_since(s.timestamp) < window),
            );
            Some((
                endpoint,
                EndpointMetrics {
                    samples_in_window: stats.sample_count,
                    requests_per_minute: stats.requests_per_minute,
                    error_rate: stats.error_rate,
                    latency,
                },
            ))
        })
        .collect();

    MetricsSnapshot {
        totals: recorder.stats(),
        endpoints,
    }
}

// ─── GET /api/metrics ────────────────────────────────────────────
/// Returns a single JSON snapshot — useful for curl / debugging.

pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
) -> Json<Generated<MetricsSnapshot>> {
    Json(Generated::now(snapshot(&state)))
}

// ─── GET /api/metrics/stream ─────────────────────────────────────
/// Server-Sent Events endpoint.
/// Pushes the endpoint health report as JSON every 2 s.

pub async fn metrics_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let interval = tokio::time::interval(STREAM_INTERVAL);

    let stream = IntervalStream::new(interval).map(move |_| {
        let report = Generated::now(EndpointHealth {
            endpoints: state.optimizer.report(),
        });
        let json = serde_json::to_string(&report).unwrap_or_default();
        Ok(Event::default().event("health").data(json))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
