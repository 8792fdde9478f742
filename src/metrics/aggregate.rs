use std::time::{Duration, Instant};

use serde::Serialize;

use super::MetricSample;

/// Summary statistics over a selection of one endpoint's samples.
/// An empty selection yields all zeros: "insufficient data" is a value, not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Stats {
    pub sample_count: usize,
    pub requests_per_minute: f64,
    pub mean_latency_ms: f64,
    pub error_rate: f64,
}

impl Stats {
    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }
}

/// Reduce a window snapshot into `Stats`.
///
/// Only samples younger than `window` (relative to `now`) are considered.
/// With `last_n`, the selection is further narrowed to the most recently
/// *inserted* `last_n` of those (slice order, not timestamp order).
pub fn aggregate(
    samples: &[MetricSample],
    now: Instant,
    window: Duration,
    last_n: Option<usize>,
) -> Stats {
    let in_window: Vec<&MetricSample> = samples
        .iter()
        .filter(|s| now.saturating_duration_since(s.timestamp) < window)
        .collect();

    let selected = match last_n {
        Some(n) => &in_window[in_window.len().saturating_sub(n)..],
        None => &in_window[..],
    };

    if selected.is_empty() {
        return Stats::default();
    }

    let count = selected.len();
    let latency_sum: f64 = selected.iter().map(|s| s.latency_ms).sum();
    let errors = selected.iter().filter(|s| s.is_error).count();
    let window_minutes = window.as_secs_f64() / 60.0;

    Stats {
        sample_count: count,
        requests_per_minute: if window_minutes > 0.0 {
            count as f64 / window_minutes
        } else {
            0.0
        },
        mean_latency_ms: latency_sum / count as f64,
        error_rate: errors as f64 / count as f64,
    }
}
