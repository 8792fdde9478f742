use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::metrics::{aggregate, MetricsRecorder, Stats};

/// Coarse per-endpoint status label for dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Excellent,
    Good,
    Warning,
    Critical,
}

impl HealthStatus {
    /// First match wins: critical, warning, excellent, otherwise good.
    pub fn classify(stats: &Stats) -> Self {
        let latency = stats.mean_latency_ms;
        let errors = stats.error_rate;

        if errors > 0.10 || latency > 1000.0 {
            Self::Critical
        } else if errors > 0.05 || latency > 500.0 {
            Self::Warning
        } else if latency < 200.0 && errors < 0.01 {
            Self::Excellent
        } else {
            Self::Good
        }
    }
}

/// One row of the health report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReportEntry {
    pub endpoint: String,
    pub average_response_time_ms: u64,
    /// 0..1, two decimals
    pub error_rate: f64,
    pub requests_per_minute: u64,
    /// Every retained sample, not just the ones behind the averages
    pub total_samples_observed: usize,
    pub status: HealthStatus,
}

impl HealthReportEntry {
    fn new(endpoint: String, stats: &Stats, total_samples_observed: usize) -> Self {
        Self {
            endpoint,
            average_response_time_ms: stats.mean_latency_ms.round() as u64,
            error_rate: (stats.error_rate * 100.0).round() / 100.0,
            requests_per_minute: stats.requests_per_minute.round() as u64,
            total_samples_observed,
            status: HealthStatus::classify(stats),
        }
    }
}

pub type HealthReport = BTreeMap<String, HealthReportEntry>;

/// Labels every endpoint with recent in-window traffic.
pub struct HealthClassifier {
    recorder: Arc<MetricsRecorder>,
    recent_samples: usize,
}

impl HealthClassifier {
    pub fn new(recorder: Arc<MetricsRecorder>, recent_samples: usize) -> Self {
        Self {
            recorder,
            recent_samples,
        }
    }

    /// Endpoints with no in-window samples are omitted.
    pub fn report(&self) -> HealthReport {
        let snapshot = self.recorder.snapshot();
        let now = self.recorder.now();
        let window = self.recorder.config().window_duration;

        snapshot
            .into_iter()
            .filter_map(|(endpoint, samples)| {
                let stats = aggregate(&samples, now, window, Some(self.recent_samples));
                if stats.is_empty() {
                    return None;
                }
                let entry = HealthReportEntry::new(endpoint.clone(), &stats, samples.len());
                Some((endpoint, entry))
            })
            .collect()
    }
}
