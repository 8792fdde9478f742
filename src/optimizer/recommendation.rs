use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::AnalysisConfig;
use crate::metrics::{aggregate, MetricsRecorder, Stats};

// ─── Rule thresholds ─────────────────────────────────────────────

/// Never recommend below this admission ceiling.
const MIN_RECOMMENDED_LIMIT: u32 = 5;

const REDUCE_LATENCY_MS: f64 = 500.0;
const REDUCE_ERROR_RATE: f64 = 0.05;

const GROW_LATENCY_MS: f64 = 200.0;
const GROW_ERROR_RATE: f64 = 0.01;
const GROW_UTILIZATION: f64 = 0.5;
const GROW_MAX_STEP: u32 = 20;

const SATURATION_UTILIZATION: f64 = 0.8;
const SATURATION_LATENCY_MS: f64 = 300.0;
const SATURATION_ERROR_RATE: f64 = 0.02;
const SATURATION_MAX_STEP: u32 = 10;

// ─── Public types ────────────────────────────────────────────────

/// The admission limit currently enforced for one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitConfig {
    pub max_requests: u32,
}

/// `endpoint -> LimitConfig`, as read by the enforcement layer.
pub type CurrentLimits = HashMap<String, LimitConfig>;

/// Which rule of the cascade produced a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitAction {
    Reduce,
    Increase,
    IncreaseModerately,
    Keep,
}

impl LimitAction {
    pub fn reason(self) -> &'static str {
        match self {
            Self::Reduce => "reduce — high latency and elevated errors",
            Self::Increase => "increase — healthy latency, low utilization",
            Self::IncreaseModerately => {
                "increase moderately — near-saturation with good performance"
            }
            Self::Keep => "current limit is optimal",
        }
    }
}

/// Advisory output for one endpoint. Never applied by this crate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub endpoint: String,
    pub current_limit: u32,
    pub recommended_limit: u32,
    pub action: LimitAction,
    pub reason: String,
    /// The evidence the rule cascade was evaluated on
    pub stats: Stats,
}

/// Proposes new admission limits from recent per-endpoint traffic.
pub struct RecommendationEngine {
    recorder: Arc<MetricsRecorder>,
    config: AnalysisConfig,
}

// ─── Rule cascade ────────────────────────────────────────────────

/// Apply the ordered, first-match rule cascade.
///
/// Scaling uses integer arithmetic (`limit * 7 / 10`) so the floor is
/// exact for every limit.
pub fn recommend(stats: &Stats, current_limit: u32) -> (u32, LimitAction) {
    let latency = stats.mean_latency_ms;
    let errors = stats.error_rate;
    let rpm = stats.requests_per_minute;
    let limit = current_limit as f64;

    if latency > REDUCE_LATENCY_MS && errors > REDUCE_ERROR_RATE {
        let reduced = scale(current_limit, 7).max(MIN_RECOMMENDED_LIMIT);
        return (reduced, LimitAction::Reduce);
    }

    if latency < GROW_LATENCY_MS && errors < GROW_ERROR_RATE && rpm < limit * GROW_UTILIZATION {
        let grown = scale(current_limit, 13).min(current_limit.saturating_add(GROW_MAX_STEP));
        return (grown, LimitAction::Increase);
    }

    if rpm > limit * SATURATION_UTILIZATION
        && latency < SATURATION_LATENCY_MS
        && errors < SATURATION_ERROR_RATE
    {
        let grown =
            scale(current_limit, 11).min(current_limit.saturating_add(SATURATION_MAX_STEP));
        return (grown, LimitAction::IncreaseModerately);
    }

    (current_limit, LimitAction::Keep)
}

/// `floor(limit * tenths / 10)`, saturating at `u32::MAX`.
fn scale(limit: u32, tenths: u64) -> u32 {
    let scaled = limit as u64 * tenths / 10;
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

// ─── RecommendationEngine impl ───────────────────────────────────

impl RecommendationEngine {
    pub fn new(recorder: Arc<MetricsRecorder>, config: AnalysisConfig) -> Self {
        Self { recorder, config }
    }

    /// One recommendation per endpoint, sorted by endpoint. Endpoints
    /// retaining fewer than `min_samples`, or with nothing left inside the
    /// window, are skipped.
    pub fn analyze(&self, current_limits: &CurrentLimits) -> Vec<Recommendation> {
        let snapshot = self.recorder.snapshot();
        let now = self.recorder.now();
        let window = self.recorder.config().window_duration;

        let mut recommendations: Vec<Recommendation> = snapshot
            .into_iter()
            .filter_map(|(endpoint, samples)| {
                if samples.len() < self.config.min_samples {
                    debug!(
                        "skipping {endpoint}: {} samples < {}",
                        samples.len(),
                        self.config.min_samples
                    );
                    return None;
                }

                let stats = aggregate(&samples, now, window, Some(self.config.recent_samples));
                // Only stale, unswept samples left: zeroed stats would read as "healthy"
                if stats.is_empty() {
                    debug!("skipping {endpoint}: no samples inside the window");
                    return None;
                }
                let current_limit = current_limits
                    .get(&endpoint)
                    .map(|l| l.max_requests)
                    .unwrap_or(self.config.default_limit);
                let (recommended_limit, action) = recommend(&stats, current_limit);

                Some(Recommendation {
                    endpoint,
                    current_limit,
                    recommended_limit,
                    action,
                    reason: action.reason().to_owned(),
                    stats,
                })
            })
            .collect();

        recommendations.sort_by(|a, b| a.endpoint.cmp(&b.endpoint));

        let changes = recommendations
            .iter()
            .filter(|r| r.action != LimitAction::Keep)
            .count();
        info!(
            "analyzed {} endpoints, {changes} limit changes recommended",
            recommendations.len()
        );

        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(mean_latency_ms: f64, error_rate: f64, requests_per_minute: f64) -> Stats {
        Stats {
            sample_count: 20,
            requests_per_minute,
            mean_latency_ms,
            error_rate,
        }
    }

    #[test]
    fn test_reduce_on_high_latency_and_errors() {
        assert_eq!(recommend(&stats(600.0, 1.0, 2.0), 30), (21, LimitAction::Reduce));
        assert_eq!(recommend(&stats(600.0, 1.0, 2.0), 90), (63, LimitAction::Reduce));
    }

    #[test]
    fn test_reduce_never_below_floor() {
        for limit in 0..=50 {
            let (recommended, action) = recommend(&stats(900.0, 0.5, 0.0), limit);
            assert_eq!(action, LimitAction::Reduce);
            assert!(recommended >= MIN_RECOMMENDED_LIMIT, "limit {limit} -> {recommended}");
        }
    }

    #[test]
    fn test_high_latency_alone_does_not_reduce() {
        // 0.05 is not > 0.05
        let (recommended, action) = recommend(&stats(800.0, 0.05, 1.0), 30);
        assert_eq!((recommended, action), (30, LimitAction::Keep));
    }

    #[test]
    fn test_increase_is_capped_additively() {
        assert_eq!(recommend(&stats(150.0, 0.0, 3.0), 30), (39, LimitAction::Increase));
        // 100 * 1.3 = 130, but the step is capped at +20
        assert_eq!(recommend(&stats(150.0, 0.0, 3.0), 100), (120, LimitAction::Increase));
    }

    #[test]
    fn test_moderate_increase_near_saturation() {
        assert_eq!(
            recommend(&stats(250.0, 0.015, 25.0), 30),
            (33, LimitAction::IncreaseModerately)
        );
        assert_eq!(
            recommend(&stats(100.0, 0.0, 450.0), 500),
            (510, LimitAction::IncreaseModerately)
        );
    }

    #[test]
    fn test_saturated_but_slow_keeps_limit() {
        assert_eq!(recommend(&stats(350.0, 0.0, 29.0), 30), (30, LimitAction::Keep));
    }

    #[test]
    fn test_middle_band_is_stable() {
        for latency in [200.0, 275.0, 350.0, 500.0] {
            for errors in [0.01, 0.03, 0.05] {
                for rpm in [0.0, 10.0, 24.0] {
                    let (recommended, action) = recommend(&stats(latency, errors, rpm), 30);
                    assert_eq!(action, LimitAction::Keep);
                    assert_eq!(recommended, 30);
                }
            }
        }
    }

    #[test]
    fn test_reduce_rule_wins_over_later_rules() {
        // Also saturated, but rule order puts reduction first
        assert_eq!(recommend(&stats(700.0, 0.2, 100.0), 30).1, LimitAction::Reduce);
    }
}
