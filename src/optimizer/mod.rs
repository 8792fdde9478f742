//! Adaptive rate-limit optimizer: per-endpoint recommendations and a
//! health classification, both computed from the recorder's windows.
//!
//! `RateLimitOptimizer` bundles the recorder, both readers and the
//! janitor lifecycle into one constructible object.

pub mod health;
pub mod recommendation;

use std::sync::Arc;
use std::time::Duration;

use log::info;
use parking_lot::Mutex;

pub use health::{HealthClassifier, HealthReport, HealthReportEntry, HealthStatus};
pub use recommendation::{
    recommend, CurrentLimits, LimitAction, LimitConfig, Recommendation, RecommendationEngine,
};

use crate::clock::{Clock, SystemClock};
use crate::config::OptimizerConfig;
use crate::janitor::Janitor;
use crate::metrics::{MetricsRecorder, RecorderStats};

/// Knobs for `analyze()` and `report()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Endpoints retaining fewer samples are skipped by `analyze()`
    pub min_samples: usize,
    /// How many of the latest samples feed a recommendation
    pub recent_samples: usize,
    /// How many of the latest samples feed a health entry
    pub health_samples: usize,
    /// Limit assumed for endpoints missing from `CurrentLimits`
    pub default_limit: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_samples: 10,
            recent_samples: 20,
            health_samples: 10,
            default_limit: 30,
        }
    }
}

pub struct RateLimitOptimizer {
    recorder: Arc<MetricsRecorder>,
    engine: RecommendationEngine,
    classifier: HealthClassifier,
    janitor_interval: Duration,
    janitor: Mutex<Option<Janitor>>,
}

impl RateLimitOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: OptimizerConfig, clock: Arc<dyn Clock>) -> Self {
        let recorder = Arc::new(MetricsRecorder::with_clock(clock, config.window));
        Self {
            engine: RecommendationEngine::new(recorder.clone(), config.analysis),
            classifier: HealthClassifier::new(recorder.clone(), config.analysis.health_samples),
            recorder,
            janitor_interval: config.janitor_interval,
            janitor: Mutex::new(None),
        }
    }

    pub fn recorder(&self) -> &Arc<MetricsRecorder> {
        &self.recorder
    }

    pub fn record(&self, endpoint: &str, latency_ms: f64, is_error: bool) {
        self.recorder.record(endpoint, latency_ms, is_error);
    }

    pub fn analyze(&self, current_limits: &CurrentLimits) -> Vec<Recommendation> {
        self.engine.analyze(current_limits)
    }

    pub fn report(&self) -> HealthReport {
        self.classifier.report()
    }

    pub fn stats(&self) -> RecorderStats {
        self.recorder.stats()
    }

    /// Spawn the janitor. Must be called from within a Tokio runtime.
    /// A second call while running is a no-op.
    pub fn start(&self) {
        let mut guard = self.janitor.lock();
        if guard.as_ref().is_some_and(|j| !j.is_finished()) {
            return;
        }
        *guard = Some(Janitor::start(self.recorder.clone(), self.janitor_interval));
        info!("optimizer started, janitor every {:?}", self.janitor_interval);
    }

    /// Cancel the janitor and wait for its task to finish.
    pub async fn stop(&self) {
        // Take the handle first so the lock is not held across the await
        let janitor = self.janitor.lock().take();
        if let Some(janitor) = janitor {
            janitor.stop().await;
            info!("optimizer stopped");
        }
    }

    /// True while a janitor task is alive.
    pub fn is_running(&self) -> bool {
        self.janitor
            .lock()
            .as_ref()
            .is_some_and(|j| !j.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn optimizer() -> (Arc<ManualClock>, RateLimitOptimizer) {
        let clock = Arc::new(ManualClock::new());
        let optimizer = RateLimitOptimizer::with_clock(OptimizerConfig::default(), clock.clone());
        (clock, optimizer)
    }

    #[test]
    fn test_no_traffic_gives_empty_outputs() {
        let (_, optimizer) = optimizer();
        assert!(optimizer.analyze(&CurrentLimits::new()).is_empty());
        assert!(optimizer.report().is_empty());
    }

    #[test]
    fn test_default_limit_used_for_unknown_endpoint() {
        let (_, optimizer) = optimizer();
        for _ in 0..12 {
            optimizer.record("GET /api/categories", 350.0, false);
        }

        let recs = optimizer.analyze(&CurrentLimits::new());

        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].current_limit, 30);
        assert_eq!(recs[0].recommended_limit, 30);
        assert_eq!(recs[0].action, LimitAction::Keep);
        assert_eq!(recs[0].reason, "current limit is optimal");
    }

    #[test]
    fn test_analyze_uses_latest_twenty_samples() {
        let (_, optimizer) = optimizer();
        // Old slow errors fall outside the last-20 selection
        for _ in 0..30 {
            optimizer.record("GET /api/orders", 900.0, true);
        }
        for _ in 0..20 {
            optimizer.record("GET /api/orders", 100.0, false);
        }

        let recs = optimizer.analyze(&CurrentLimits::new());

        assert_eq!(recs[0].stats.sample_count, 20);
        assert_eq!(recs[0].stats.mean_latency_ms, 100.0);
        assert_eq!(recs[0].action, LimitAction::Increase);
    }

    #[test]
    fn test_analyze_does_not_mutate_limits_or_windows() {
        let (_, optimizer) = optimizer();
        for _ in 0..10 {
            optimizer.record("GET /x", 600.0, true);
        }
        let limits: CurrentLimits =
            [("GET /x".to_string(), LimitConfig { max_requests: 30 })].into();
        let before = optimizer.stats();

        let _ = optimizer.analyze(&limits);

        assert_eq!(limits["GET /x"].max_requests, 30);
        assert_eq!(optimizer.stats(), before);
    }

    #[test]
    fn test_report_total_counts_all_retained_samples() {
        let (_, optimizer) = optimizer();
        for _ in 0..25 {
            optimizer.record("GET /api/products", 80.0, false);
        }

        let report = optimizer.report();
        let entry = &report["GET /api/products"];

        assert_eq!(entry.total_samples_observed, 25);
        // Only the last 10 drive the rate: 10 / 5 min
        assert_eq!(entry.requests_per_minute, 2);
        assert_eq!(entry.status, HealthStatus::Excellent);
    }

    #[test]
    fn test_stale_samples_are_not_analyzed() {
        let (clock, optimizer) = optimizer();
        for _ in 0..15 {
            optimizer.record("GET /x", 100.0, false);
        }
        clock.advance(Duration::from_secs(6 * 60));

        assert!(optimizer.analyze(&CurrentLimits::new()).is_empty());
        assert!(optimizer.report().is_empty());
    }

    #[test]
    fn test_partly_stale_window_is_still_analyzed() {
        let (clock, optimizer) = optimizer();
        for _ in 0..5 {
            optimizer.record("GET /api/orders", 100.0, false);
        }
        clock.advance(Duration::from_secs(120));
        for _ in 0..7 {
            optimizer.record("GET /api/orders", 100.0, false);
        }
        // First five are now older than the window but not yet swept
        clock.advance(Duration::from_secs(210));

        let recs = optimizer.analyze(&CurrentLimits::new());

        assert_eq!(optimizer.stats().samples, 12);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].stats.sample_count, 7);
        assert_eq!(recs[0].action, LimitAction::Increase);
    }

    #[tokio::test]
    async fn test_start_stop_lifecycle() {
        let (_, optimizer) = optimizer();
        assert!(!optimizer.is_running());

        optimizer.start();
        optimizer.start();
        assert!(optimizer.is_running());

        optimizer.stop().await;
        assert!(!optimizer.is_running());

        // Stopping twice is harmless
        optimizer.stop().await;
    }

    #[tokio::test]
    async fn test_zero_janitor_interval_does_not_kill_the_task() {
        let config = OptimizerConfig {
            janitor_interval: Duration::ZERO,
            ..OptimizerConfig::default()
        };
        let optimizer = RateLimitOptimizer::new(config);

        optimizer.start();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(optimizer.is_running());
        optimizer.stop().await;
        assert!(!optimizer.is_running());
    }
}
